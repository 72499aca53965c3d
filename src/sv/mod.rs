pub mod partner;
#[cfg(test)]
pub mod test_utils;
pub mod user;

pub use partner::Partner;
pub use user::User;
