use crate::exif::ExifSummary;

const MAKE_WIDTH: usize = 15;
const MODEL_WIDTH: usize = 20;
const LENS_WIDTH: usize = 25;

/// Render query results as an aligned text table.
///
/// The filename column is as wide as the longest filename (or its header);
/// the other columns have fixed minimum widths. Returns the header, a dash
/// separator and one line per row.
pub fn summary_table(rows: &[ExifSummary]) -> Vec<String> {
    let name_width = rows
        .iter()
        .map(|r| r.filename.chars().count())
        .chain(std::iter::once("Filename".len()))
        .max()
        .unwrap_or(0);

    let line = |name: &str, make: &str, model: &str, lens: &str| {
        format!(
            "{name:<name_width$} | {make:<MAKE_WIDTH$} | {model:<MODEL_WIDTH$} | {lens:<LENS_WIDTH$}"
        )
        .trim_end()
        .to_string()
    };

    let header = line("Filename", "Make", "Model", "Lens Model");
    let separator = "-".repeat(name_width + MAKE_WIDTH + MODEL_WIDTH + LENS_WIDTH + 9);

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(header);
    out.push(separator);
    out.extend(
        rows.iter()
            .map(|r| line(&r.filename, &r.make, &r.model, &r.lens_model)),
    );
    out
}
