// src/handlers/mod.rs

pub mod pages;
pub mod quiz;
pub mod teacher;
