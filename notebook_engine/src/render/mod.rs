mod weekly_pdf;

pub use weekly_pdf::WeeklyPdfRenderer;
