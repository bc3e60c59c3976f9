use crate::activation::ActivationTable;
use crate::error::IoError;
use crate::parameter::ModelParameters;
use log::info;
use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::{BufWriter, Write};

/// Include guard of the generated header
const HEADER_GUARD: &str = "NETWORK_H";

/// Formats one value the way `printf("%8.5f")` does
fn format_value(value: f32) -> String {
    format!("{:8.5}", value)
}

/// Renders a 2-D array declaration, one brace-enclosed row per line
fn format_matrix(name: &str, matrix: &Array2<f32>) -> String {
    let rows: Vec<String> = matrix
        .outer_iter()
        .map(|row| {
            row.iter()
                .map(|&v| format_value(v))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();
    format!(
        "const float {}[{}][{}] = {{\n{{{}}}\n}};\n\n",
        name,
        matrix.nrows(),
        matrix.ncols(),
        rows.join("},\n{")
    )
}

/// Renders a 1-D array declaration on a single line
fn format_vector(name: &str, vector: &Array1<f32>) -> String {
    let values: Vec<String> = vector.iter().map(|&v| format_value(v)).collect();
    format!(
        "const float {}[{}] = {{\n{}\n}};\n\n",
        name,
        vector.len(),
        values.join(",")
    )
}

/// Renders the tanh lookup table as an array of `tanh_t` records
fn format_lookup_table(table: &ActivationTable) -> String {
    let entries: Vec<String> = table
        .samples()
        .iter()
        .map(|&(x, y)| format!("{{{}, {}}}", format_value(x), format_value(y)))
        .collect();
    format!(
        "typedef struct {{ float x; float y; }} tanh_t;\n\ntanh_t tanh_lookup[{}] = {{\n{}\n}};\n\n",
        table.len(),
        entries.join(",\n")
    )
}

/// Serializes a configured classifier into a self-contained C header.
///
/// The header declares, in this order and under these names:
///
/// 1. `lstm_wi`, `lstm_wf`, `lstm_wc`, `lstm_wo` - gate input kernels (input_dim x units)
/// 2. `lstm_ui`, `lstm_uf`, `lstm_uc`, `lstm_uo` - gate recurrent kernels (units x units)
/// 3. `lstm_bi`, `lstm_bf`, `lstm_bc`, `lstm_bo` - gate biases (units)
/// 4. `dense_kernel` (units x classes) and `dense_bias` (classes)
/// 5. `input_size`, `lstm_units`, `output_size`
/// 6. `val_max`, `val_min`, `step_size`, `feature_width`
/// 7. the `tanh_t` record type and the `tanh_lookup` table
///
/// Firmware parses these by name and has no shape checks of its own, so the
/// declared dimensions always equal the array shapes. Every value is printed
/// with `%8.5f` precision.
pub struct HeaderExporter<'a> {
    parameters: &'a ModelParameters,
    table: &'a ActivationTable,
}

impl<'a> HeaderExporter<'a> {
    /// Creates an exporter over the given parameters and activation table
    pub fn new(parameters: &'a ModelParameters, table: &'a ActivationTable) -> Self {
        Self { parameters, table }
    }

    /// Renders the complete header text.
    pub fn render(&self) -> String {
        let cell = self.parameters.cell();
        let dense = self.parameters.dense();
        let preprocessing = self.parameters.preprocessing();
        let gates = [
            ("i", cell.input_gate()),
            ("f", cell.forget_gate()),
            ("c", cell.cell_gate()),
            ("o", cell.output_gate()),
        ];

        let mut out = format!("#ifndef {0}\n#define {0}\n\n", HEADER_GUARD);
        for (suffix, gate) in &gates {
            out.push_str(&format_matrix(&format!("lstm_w{}", suffix), gate.kernel()));
        }
        for (suffix, gate) in &gates {
            out.push_str(&format_matrix(
                &format!("lstm_u{}", suffix),
                gate.recurrent_kernel(),
            ));
        }
        for (suffix, gate) in &gates {
            out.push_str(&format_vector(&format!("lstm_b{}", suffix), gate.bias()));
        }
        out.push_str(&format_matrix("dense_kernel", dense.kernel()));
        out.push_str(&format_vector("dense_bias", dense.bias()));

        out.push_str(&format!("#define input_size {}\n", cell.input_dim()));
        out.push_str(&format!("#define lstm_units {}\n", cell.units()));
        out.push_str(&format!("#define output_size {}\n\n", dense.output_dim()));

        // Debug keeps the decimal point, so the macros stay floating-point literals
        out.push_str(&format!("#define val_max {:?}\n", preprocessing.val_max()));
        out.push_str(&format!("#define val_min {:?}\n", preprocessing.val_min()));
        out.push_str(&format!("#define step_size {}\n", preprocessing.step_size()));
        out.push_str(&format!(
            "#define feature_width {}\n\n",
            preprocessing.feature_width()
        ));

        out.push_str(&format_lookup_table(self.table));
        out.push_str(&format!("#endif // {}", HEADER_GUARD));
        out
    }

    /// Writes the header to `path`, replacing any existing file.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Header successfully written
    /// - `Err(IoError::StdIoError)` - File creation or write operation failed
    pub fn write_to_path(&self, path: &str) -> Result<(), IoError> {
        let header = self.render();

        let file = File::create(path).map_err(IoError::StdIoError)?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(header.as_bytes())
            .map_err(IoError::StdIoError)?;
        writer.flush().map_err(IoError::StdIoError)?;

        info!(
            "exported LSTM header to {} ({} units, {} lookup samples)",
            path,
            self.parameters.units(),
            self.table.len()
        );
        Ok(())
    }
}
