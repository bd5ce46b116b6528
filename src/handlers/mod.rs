pub mod companies;
pub mod system;
