pub mod partner_discount;
pub mod user;
