pub mod csv_workbook;

pub use csv_workbook::CsvWorkbookExporter;
