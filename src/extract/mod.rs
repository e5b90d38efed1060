pub mod assemble;
pub mod fields;
pub mod layout;

#[cfg(test)]
mod tests;
