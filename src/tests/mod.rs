#[cfg(test)]
pub mod config_tests;



#[cfg(test)]
pub mod report_tests;
