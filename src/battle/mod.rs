pub mod controller;
pub mod participant;
pub mod resolver;
pub mod state;

#[cfg(test)]
mod tests;
