// Each integration test binary uses a different subset of these helpers.
#![allow(dead_code)]

pub mod recorders;
pub mod scripted_service;
