pub mod configured;
