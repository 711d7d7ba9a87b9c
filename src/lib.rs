pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod form;
pub mod loading;
pub mod modal;
pub mod notify;
pub mod output;
pub mod render;
pub mod surface;

#[cfg(test)]
mod tests;
