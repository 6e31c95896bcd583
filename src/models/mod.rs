pub mod course;
pub mod user;

pub use course::{Entity as Course, Lecture, Lectures, MediaRef, Model as CourseModel};
pub use user::{Entity as User, Model as UserModel};
