pub mod board;
pub mod company;
pub mod contact;
pub mod invoice;
pub mod note;
pub mod project;
pub mod task;
pub mod uploaded_file;
pub mod user;
pub mod workflow;
