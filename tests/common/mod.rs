#![allow(dead_code)]

pub mod strategies;

pub use strategies::*;
