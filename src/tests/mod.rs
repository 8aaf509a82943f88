#[cfg(test)]
mod common;



#[cfg(test)]
mod problem_test;
