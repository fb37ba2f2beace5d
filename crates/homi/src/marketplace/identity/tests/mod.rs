mod common;

mod registration;
mod upgrade;
