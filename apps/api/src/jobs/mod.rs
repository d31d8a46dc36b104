// Job postings: the CRUD surface intake validates against.

pub mod handlers;

use rand::Rng;

/// `JOB` followed by 8 random digits, e.g. `JOB48213907`.
pub fn generate_job_id() -> String {
    let n: u32 = rand::rng().random_range(10_000_000..100_000_000);
    format!("JOB{n}")
}
