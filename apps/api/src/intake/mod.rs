// Application intake: multipart submission, staging, status polling and
// listing of scored applications.

pub mod form;
pub mod handlers;
pub mod staging;
