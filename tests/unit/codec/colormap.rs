use super::*;

#[test]
fn identity_comes_first_and_duplicates_collapse() {
    let frame = Frame::new(1, 1, 3, vec![255, 0, 0]).unwrap();
    let out = apply_colormaps(&frame, &[Colormap::Hsv, Colormap::Rgb, Colormap::Hsv]).unwrap();
    let names: Vec<&str> = out.iter().map(|(m, _)| m.name()).collect();
    assert_eq!(names, vec!["rgb", "hsv"]);
    assert_eq!(out[0].1, frame);
}

#[test]
fn gray_source_gets_gray_identity_and_rgb_expansion() {
    let frame = Frame::new(1, 2, 1, vec![10, 20]).unwrap();
    let out = apply_colormaps(&frame, &[Colormap::Rgb]).unwrap();
    assert_eq!(out[0].0, Colormap::Gray);
    assert_eq!(out[1].1.channels, 3);
    assert_eq!(out[1].1.data, vec![10, 10, 10, 20, 20, 20]);
}

#[test]
fn primaries_convert_with_half_degree_hue() {
    assert_eq!(rgb_to_hsv(255, 0, 0), [0, 255, 255]);
    assert_eq!(rgb_to_hsv(0, 255, 0), [60, 255, 255]);
    assert_eq!(rgb_to_hsv(0, 0, 255), [120, 255, 255]);
    assert_eq!(rgb_to_hls(255, 255, 255), [0, 255, 0]);
    assert_eq!(rgb_to_hls(255, 0, 0), [0, 128, 255]);
    assert_eq!(luma(255, 255, 255), 255);
}

#[test]
fn unknown_colormap_name_is_rejected() {
    assert!("lab".parse::<Colormap>().is_err());
    assert_eq!("GRAY".parse::<Colormap>().unwrap(), Colormap::Gray);
}
