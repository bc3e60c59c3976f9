use super::*;

fn tiny_parameters() -> ModelParameters {
    let cell = LSTMCell::from_combined(
        array![[0.1, 0.2, 0.3, 0.4]],
        array![[-1.0, 0.5, 0.0, 2.0]],
        array![0.0, 1.0, 0.0, 0.0],
    )
    .unwrap();
    let dense = Dense::new(array![[1.5]], array![-0.25]).unwrap();
    ModelParameters::new(cell, dense, default_preprocessing()).unwrap()
}

#[test]
fn test_render_tiny_model() {
    let parameters = tiny_parameters();
    let table = ActivationTable::from_samples(vec![(0.0, 0.0), (1.0, 0.5)]).unwrap();
    let header = HeaderExporter::new(&parameters, &table).render();

    let expected = "#ifndef NETWORK_H\n#define NETWORK_H\n\n\
const float lstm_wi[1][1] = {\n{ 0.10000}\n};\n\n\
const float lstm_wf[1][1] = {\n{ 0.20000}\n};\n\n\
const float lstm_wc[1][1] = {\n{ 0.30000}\n};\n\n\
const float lstm_wo[1][1] = {\n{ 0.40000}\n};\n\n\
const float lstm_ui[1][1] = {\n{-1.00000}\n};\n\n\
const float lstm_uf[1][1] = {\n{ 0.50000}\n};\n\n\
const float lstm_uc[1][1] = {\n{ 0.00000}\n};\n\n\
const float lstm_uo[1][1] = {\n{ 2.00000}\n};\n\n\
const float lstm_bi[1] = {\n 0.00000\n};\n\n\
const float lstm_bf[1] = {\n 1.00000\n};\n\n\
const float lstm_bc[1] = {\n 0.00000\n};\n\n\
const float lstm_bo[1] = {\n 0.00000\n};\n\n\
const float dense_kernel[1][1] = {\n{ 1.50000}\n};\n\n\
const float dense_bias[1] = {\n-0.25000\n};\n\n\
#define input_size 1\n\
#define lstm_units 1\n\
#define output_size 1\n\n\
#define val_max 1000.0\n\
#define val_min 0.0\n\
#define step_size 6\n\
#define feature_width 10\n\n\
typedef struct { float x; float y; } tanh_t;\n\n\
tanh_t tanh_lookup[2] = {\n\
{ 0.00000,  0.00000},\n\
{ 1.00000,  0.50000}\n\
};\n\n\
#endif // NETWORK_H";

    assert_eq!(header, expected);
}

#[test]
fn test_render_matrix_rows() {
    let cell = LSTMCell::from_combined(
        Array2::from_elem((1, 8), 0.0),
        Array2::from_elem((2, 8), 0.0),
        Array1::zeros(8),
    )
    .unwrap();
    let dense = Dense::new(
        array![[0.5, -0.5, 0.0], [0.25, 0.75, -1.0]],
        array![0.01, 0.02, 0.03],
    )
    .unwrap();
    let parameters = ModelParameters::new(cell, dense, default_preprocessing()).unwrap();
    let header = HeaderExporter::new(&parameters, &default_table()).render();

    assert!(header.contains(
        "const float dense_kernel[2][3] = {\n{ 0.50000,-0.50000, 0.00000},\n{ 0.25000, 0.75000,-1.00000}\n};\n\n"
    ));
    assert!(header.contains("const float dense_bias[3] = {\n 0.01000, 0.02000, 0.03000\n};\n\n"));
}

#[test]
fn test_declared_dimensions_match_shapes() {
    let parameters = random_parameters(3, 4, 5, 8);
    let header = HeaderExporter::new(&parameters, &default_table()).render();

    for gate in ["i", "f", "c", "o"] {
        assert!(header.contains(&format!("const float lstm_w{}[3][4] = {{", gate)));
        assert!(header.contains(&format!("const float lstm_u{}[4][4] = {{", gate)));
        assert!(header.contains(&format!("const float lstm_b{}[4] = {{", gate)));
    }
    assert!(header.contains("const float dense_kernel[4][5] = {"));
    assert!(header.contains("const float dense_bias[5] = {"));
    assert!(header.contains("#define input_size 3\n"));
    assert!(header.contains("#define lstm_units 4\n"));
    assert!(header.contains("#define output_size 5\n"));
    assert!(header.starts_with("#ifndef NETWORK_H\n#define NETWORK_H\n"));
    assert!(header.ends_with("#endif // NETWORK_H"));
}

#[test]
fn test_declaration_order() {
    let parameters = random_parameters(1, 2, 2, 9);
    let header = HeaderExporter::new(&parameters, &default_table()).render();
    let names = [
        "lstm_wi", "lstm_wf", "lstm_wc", "lstm_wo", "lstm_ui", "lstm_uf", "lstm_uc", "lstm_uo",
        "lstm_bi", "lstm_bf", "lstm_bc", "lstm_bo", "dense_kernel", "dense_bias", "input_size",
        "lstm_units", "output_size", "val_max", "val_min", "step_size", "feature_width",
        "tanh_lookup",
    ];
    let positions: Vec<usize> = names
        .iter()
        .map(|name| header.find(name).unwrap())
        .collect();
    for pair in positions.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}

#[test]
fn test_default_lookup_table_rows() {
    let parameters = random_parameters(1, 2, 2, 10);
    let header = HeaderExporter::new(&parameters, &default_table()).render();

    assert!(header.contains("tanh_t tanh_lookup[26] = {\n{ 0.00000,  0.00000},\n{ 0.10000,  0.09967},\n"));
    assert!(header.contains("{ 2.50000,  0.98661}\n};\n\n#endif // NETWORK_H"));

    let start = header.find("tanh_lookup[26]").unwrap();
    let rows = header[start..].lines().filter(|l| l.starts_with('{')).count();
    assert_eq!(rows, 26);
}

#[test]
fn test_preprocessing_macros() {
    let random = random_parameters(1, 2, 2, 12);
    let preprocessing = PreprocessingParams::new(-12.5, 812.25, 16, 3).unwrap();
    let parameters = ModelParameters::new(random.cell().clone(), random.dense().clone(), preprocessing).unwrap();
    let header = HeaderExporter::new(&parameters, &default_table()).render();

    assert!(header.contains(
        "#define val_max 812.25\n#define val_min -12.5\n#define step_size 3\n#define feature_width 16\n\n"
    ));
}

#[test]
fn test_export_model_writes_rendered_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("network.h");
    let path = path.to_str().unwrap();

    let classifier = LSTMClassifier::new(tiny_parameters());
    classifier.export_model(path).unwrap();

    let written = std::fs::read_to_string(path).unwrap();
    let rendered =
        HeaderExporter::new(classifier.parameters(), classifier.activation_table()).render();
    assert_eq!(written, rendered);

    // exporting again replaces the file
    classifier.export_model(path).unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), rendered);
}

#[test]
fn test_export_to_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("network.h");
    let classifier = LSTMClassifier::new(tiny_parameters());
    assert!(matches!(
        classifier.export_model(path.to_str().unwrap()),
        Err(IoError::StdIoError(_))
    ));
}
