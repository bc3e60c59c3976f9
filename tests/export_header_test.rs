use lumen_lstm::prelude::*;
use ndarray::{Array1, Array2, array};
use std::collections::HashMap;

/// Collects every `const float name[..] = {..};` declaration and every `#define`
/// of a generated header.
fn parse_header(header: &str) -> (HashMap<String, (Vec<usize>, Vec<f32>)>, HashMap<String, String>) {
    let mut arrays = HashMap::new();
    let mut defines = HashMap::new();
    let mut rest = header;

    while let Some(start) = rest.find("const float ") {
        let decl = &rest[start + "const float ".len()..];
        let open = decl.find(" = {").unwrap();
        let close = decl.find("};").unwrap();

        let signature = &decl[..open];
        let name_end = signature.find('[').unwrap();
        let name = signature[..name_end].to_string();
        let dims: Vec<usize> = signature[name_end..]
            .split(|c: char| c == '[' || c == ']')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().unwrap())
            .collect();

        let values: Vec<f32> = decl[open + " = {".len()..close]
            .split(|c: char| c == ',' || c == '{' || c == '}' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().unwrap())
            .collect();

        arrays.insert(name, (dims, values));
        rest = &decl[close..];
    }

    for line in header.lines() {
        if let Some(define) = line.strip_prefix("#define ") {
            let mut parts = define.splitn(2, ' ');
            let key = parts.next().unwrap().to_string();
            let value = parts.next().unwrap_or("").to_string();
            defines.insert(key, value);
        }
    }
    (arrays, defines)
}

fn assert_close(parsed: &[f32], expected: impl IntoIterator<Item = f32>) {
    let expected: Vec<f32> = expected.into_iter().collect();
    assert_eq!(parsed.len(), expected.len());
    for (got, want) in parsed.iter().zip(expected.iter()) {
        assert!((got - want).abs() <= 1e-5, "{} vs {}", got, want);
    }
}

fn sample_parameters() -> ModelParameters {
    let kernel = Array2::from_shape_fn((2, 12), |(i, j)| ((i * 12 + j) as f32 * 0.137).sin());
    let recurrent = Array2::from_shape_fn((3, 12), |(i, j)| ((i * 12 + j) as f32 * 0.291).cos() * 0.8);
    let bias = Array1::from_shape_fn(12, |j| j as f32 * 0.05 - 0.3);
    let cell = LSTMCell::from_combined(kernel, recurrent, bias).unwrap();
    let dense = Dense::new(
        array![[0.123456, -0.654321], [1.5, -2.25], [0.333333, 0.666667]],
        array![0.000004, -0.1],
    )
    .unwrap();
    let preprocessing = PreprocessingParams::new(12.0, 812.5, 10, 6).unwrap();
    ModelParameters::new(cell, dense, preprocessing).unwrap()
}

#[test]
fn test_exported_header_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("network.h");
    let path = path.to_str().unwrap();

    let parameters = sample_parameters();
    let classifier = LSTMClassifier::new(parameters.clone());
    classifier.export_model(path).unwrap();

    let header = std::fs::read_to_string(path).unwrap();
    let (arrays, defines) = parse_header(&header);
    assert_eq!(arrays.len(), 14);

    let cell = parameters.cell();
    let gates = [
        ("i", cell.input_gate()),
        ("f", cell.forget_gate()),
        ("c", cell.cell_gate()),
        ("o", cell.output_gate()),
    ];
    for (suffix, gate) in gates {
        let (dims, values) = &arrays[&format!("lstm_w{}", suffix)];
        assert_eq!(dims, &vec![2, 3]);
        assert_close(values, gate.kernel().iter().cloned());

        let (dims, values) = &arrays[&format!("lstm_u{}", suffix)];
        assert_eq!(dims, &vec![3, 3]);
        assert_close(values, gate.recurrent_kernel().iter().cloned());

        let (dims, values) = &arrays[&format!("lstm_b{}", suffix)];
        assert_eq!(dims, &vec![3]);
        assert_close(values, gate.bias().iter().cloned());
    }

    let (dims, values) = &arrays["dense_kernel"];
    assert_eq!(dims, &vec![3, 2]);
    assert_close(values, parameters.dense().kernel().iter().cloned());
    let (dims, values) = &arrays["dense_bias"];
    assert_eq!(dims, &vec![2]);
    assert_close(values, parameters.dense().bias().iter().cloned());

    assert_eq!(defines["input_size"], "2");
    assert_eq!(defines["lstm_units"], "3");
    assert_eq!(defines["output_size"], "2");
    assert_eq!(defines["val_min"], "12.0");
    assert_eq!(defines["val_max"], "812.5");
    assert_eq!(defines["step_size"], "6");
    assert_eq!(defines["feature_width"], "10");
    assert_eq!(defines["NETWORK_H"], "");
}

#[test]
fn test_exported_lookup_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("network.h");
    let path = path.to_str().unwrap();

    let parameters = sample_parameters();
    let table = ActivationTable::new(3.0, 31).unwrap();
    HeaderExporter::new(&parameters, &table)
        .write_to_path(path)
        .unwrap();
    let header = std::fs::read_to_string(path).unwrap();

    let start = header.find("tanh_t tanh_lookup[31] = {").unwrap();
    let body = &header[start..];
    let entries: Vec<(f32, f32)> = body
        .lines()
        .filter(|line| line.starts_with('{'))
        .map(|line| {
            let inner = line.trim_end_matches(',').trim_matches(|c: char| c == '{' || c == '}');
            let mut values = inner.split(',').map(|v| v.trim().parse::<f32>().unwrap());
            (values.next().unwrap(), values.next().unwrap())
        })
        .collect();

    assert_eq!(entries.len(), table.len());
    for (&(x, y), &(px, py)) in table.samples().iter().zip(entries.iter()) {
        assert!((x - px).abs() <= 1e-5);
        assert!((y - py).abs() <= 1e-5);
    }
    assert!((entries[30].0 - 3.0).abs() <= 1e-6);
}
