pub mod cli;
pub mod otp;
