use super::*;

#[test]
fn output_shape_requires_three_dims() {
    assert!(OutputShape::from_dims(&[64, 64]).is_err());
    assert!(OutputShape::from_dims(&[64, 64, 3, 1]).is_err());
    let s = OutputShape::from_dims(&[32, 48, 3]).unwrap();
    assert_eq!(s.points(), 32 * 48);
    assert_eq!(s.values(), 32 * 48 * 3);
}

#[test]
fn output_shape_parses_and_displays() {
    let s: OutputShape = "128x64x1".parse().unwrap();
    assert_eq!(
        s,
        OutputShape {
            x_dim: 128,
            y_dim: 64,
            c_dim: 1
        }
    );
    assert_eq!(s.to_string(), "128x64x1");
    assert!("128x64".parse::<OutputShape>().is_err());
    assert!("128x64x4".parse::<OutputShape>().is_err());
    assert!("ax64x3".parse::<OutputShape>().is_err());
}

#[test]
fn frame_rejects_mismatched_len() {
    assert!(Frame::new(2, 2, 3, vec![0; 11]).is_err());
    assert!(Frame::new(2, 2, 3, vec![0; 12]).is_ok());
}

#[test]
fn value_span_is_max_minus_min() {
    let f = Frame::new(1, 3, 1, vec![200, 205, 201]).unwrap();
    assert_eq!(f.value_span(), 5);
    let f = Frame::new(1, 2, 1, vec![0, 255]).unwrap();
    assert_eq!(f.value_span(), 255);
}

#[test]
fn defaults_match_generation_defaults() {
    assert_eq!(Zoom::default(), Zoom(0.5, 0.5));
    assert_eq!(Pan::default(), Pan(2.0, 2.0));
}
