//! OFF, COFF and OBJ vertex list tests

use crate::{
    obj::{ObjReader, ObjWriter},
    off::{OffReader, OffWriter},
    read_vertices, write_vertices, MeshVertices, VertexReader, VertexWriter,
};
use meshcorr_core::{Error, Point3d, DEFAULT_RGBA};
use std::io::Cursor;
use tempfile::TempDir;

#[test]
fn test_read_coff_with_colors_and_faces() {
    let content = "COFF
4 2 0
0.0 0.0 0.0 255 0 0 255
1.0 0.0 0.0 0 255 0 255
1.0 1.0 0.0 0 0 255 128
0.0 1.0 0.5 255 255 255 0
3 0 1 2
3 0 2 3
";
    let vertices = OffReader::read_from(Cursor::new(content)).unwrap();

    assert_eq!(vertices.len(), 4);
    assert_eq!(vertices.positions[3], Point3d::new(0.0, 1.0, 0.5));
    let colors = vertices.colors().unwrap();
    assert_eq!(colors[0], [255, 0, 0, 255]);
    assert_eq!(colors[2], [0, 0, 255, 128]);
    assert_eq!(colors[3], [255, 255, 255, 0]);
}

#[test]
fn test_read_plain_off_has_no_colors() {
    let content = "OFF\n# a comment\n3 0 0\n\n0 0 0\n1 2 3 # trailing\n-1.5 2e-3 4\n";
    let vertices = OffReader::read_from(Cursor::new(content)).unwrap();

    assert_eq!(vertices.len(), 3);
    assert!(vertices.colors.is_none());
    assert_eq!(vertices.positions[2], Point3d::new(-1.5, 0.002, 4.0));
}

#[test]
fn test_coff_vertex_without_color_gets_default() {
    let content = "COFF\n2 0 0\n0 0 0 10 20 30 40\n1 1 1\n";
    let vertices = OffReader::read_from(Cursor::new(content)).unwrap();

    let colors = vertices.colors().unwrap();
    assert_eq!(colors[0], [10, 20, 30, 40]);
    assert_eq!(colors[1], DEFAULT_RGBA);
}

#[test]
fn test_coff_rgb_without_alpha_is_opaque() {
    let content = "COFF\n2 0 0\n0 0 0 10 20 30\n1 1 1 40 50 60 70\n";
    let vertices = OffReader::read_from(Cursor::new(content)).unwrap();

    let colors = vertices.colors().unwrap();
    assert_eq!(colors[0], [10, 20, 30, 255]);
    assert_eq!(colors[1], [40, 50, 60, 70]);
}

#[test]
fn test_incomplete_color_is_a_parse_error() {
    let result = OffReader::read_from(Cursor::new("COFF\n1 0 0\n0 0 0 10 20\n"));
    assert!(matches!(result, Err(Error::Parse { line: 3, .. })));
}

#[test]
fn test_huge_vertex_count_reports_truncation() {
    let result = OffReader::read_from(Cursor::new("OFF\n100000000000000000 0 0\n0 0 0\n"));
    match result {
        Err(Error::Parse { message, .. }) => {
            assert!(message.contains("expected 100000000000000000 vertices, found 1"));
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_counts_on_header_line() {
    let content = "OFF 2 0 0\n0 0 0\n1 1 1\n";
    let vertices = OffReader::read_from(Cursor::new(content)).unwrap();
    assert_eq!(vertices.len(), 2);
}

#[test]
fn test_off_errors() {
    let bad_header = OffReader::read_from(Cursor::new("PLY\n1 0 0\n0 0 0\n"));
    assert!(matches!(bad_header, Err(Error::Parse { line: 1, .. })));

    let truncated = OffReader::read_from(Cursor::new("OFF\n3 0 0\n0 0 0\n1 1 1\n"));
    assert!(matches!(truncated, Err(Error::Parse { .. })));

    let bad_number = OffReader::read_from(Cursor::new("OFF\n1 0 0\n0 zero 0\n"));
    assert!(matches!(bad_number, Err(Error::Parse { line: 3, .. })));

    let bad_color = OffReader::read_from(Cursor::new("COFF\n1 0 0\n0 0 0 300 0 0 255\n"));
    assert!(matches!(bad_color, Err(Error::Parse { line: 3, .. })));

    let empty = OffReader::read_from(Cursor::new(""));
    assert!(empty.is_err());
}

#[test]
fn test_non_finite_coordinates_are_rejected() {
    let result = OffReader::read_from(Cursor::new("OFF\n2 0 0\n0 0 0\nnan 1 1\n"));
    match result {
        Err(Error::Parse { line, message }) => {
            assert_eq!(line, 4);
            assert!(message.contains("non-finite"));
        }
        other => panic!("expected parse error, got {:?}", other),
    }

    let obj = ObjReader::read_from(Cursor::new("v 0 inf 0\n"));
    assert!(matches!(obj, Err(Error::Parse { line: 1, .. })));
}

#[test]
fn test_read_obj_vertex_lines_only() {
    let content = "# flame template
o head
v 0.1 0.2 0.3
vn 0 0 1
vt 0.5 0.5
v -0.1 -0.2 -0.3 1.0
f 1 2 1
";
    let vertices = ObjReader::read_from(Cursor::new(content)).unwrap();

    assert_eq!(
        vertices.positions,
        vec![Point3d::new(0.1, 0.2, 0.3), Point3d::new(-0.1, -0.2, -0.3)]
    );
    assert!(vertices.colors.is_none());
}

#[test]
fn test_off_writer_round_trip_is_exact() {
    let positions = vec![
        Point3d::new(0.1, -0.000_123_456_789, 12.5),
        Point3d::new(1.0 / 3.0, 2.0 / 3.0, -7.0),
    ];
    let vertices =
        MeshVertices::with_colors(positions.clone(), vec![[1, 2, 3, 4], [250, 251, 252, 253]])
            .unwrap();

    let mut buffer = Vec::new();
    OffWriter::write_to(&vertices, &mut buffer).unwrap();
    let text = String::from_utf8(buffer.clone()).unwrap();
    assert!(text.starts_with("COFF\n2 0 0\n"));

    let loaded = OffReader::read_from(Cursor::new(buffer)).unwrap();
    assert_eq!(loaded, vertices);
}

#[test]
fn test_auto_detect_functions() {
    let temp_dir = TempDir::new().unwrap();
    let off_path = temp_dir.path().join("auto.off");
    let obj_path = temp_dir.path().join("auto.OBJ");
    let vertices = MeshVertices::new(vec![Point3d::new(1.0, 2.0, 3.0), Point3d::new(4.0, 5.0, 6.0)]);

    write_vertices(&vertices, &off_path).unwrap();
    write_vertices(&vertices, &obj_path).unwrap();

    assert_eq!(read_vertices(&off_path).unwrap(), vertices);
    assert_eq!(read_vertices(&obj_path).unwrap(), vertices);
    assert_eq!(ObjReader::read_vertices(&obj_path).unwrap(), vertices);
}

#[test]
fn test_obj_writer_drops_colors() {
    let vertices =
        MeshVertices::with_colors(vec![Point3d::new(0.5, 0.5, 0.5)], vec![[9, 9, 9, 9]]).unwrap();
    let mut buffer = Vec::new();
    ObjWriter::write_to(&vertices, &mut buffer).unwrap();
    assert_eq!(String::from_utf8(buffer).unwrap(), "v 0.5 0.5 0.5\n");
}

#[test]
fn test_unsupported_format() {
    assert!(matches!(
        read_vertices("mesh.stl"),
        Err(Error::UnsupportedFormat(_))
    ));
    assert!(matches!(
        write_vertices(&MeshVertices::default(), "mesh.ply"),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_color_length_mismatch() {
    assert!(MeshVertices::with_colors(vec![Point3d::origin()], vec![]).is_err());
}
