pub mod training_result;
