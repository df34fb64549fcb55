mod compaction_test;
mod invalid_input_test;
mod lock_test;
