//! IO adapters: the REST surface and its DTO mappers.

pub mod mappers;
pub mod rest;
