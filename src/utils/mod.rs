// src/utils/mod.rs

pub mod teacher_key;
