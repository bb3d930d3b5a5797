pub mod use_cases;

pub use use_cases::compare_export::CompareExportUseCase;
