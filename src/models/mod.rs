pub mod garden;
pub mod interaction;
pub mod question;
pub mod session;
pub mod user;
