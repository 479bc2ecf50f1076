pub mod skyward_salvo;

pub use skyward_salvo::skyward_salvo;
