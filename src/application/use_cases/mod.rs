pub mod compare_export;
