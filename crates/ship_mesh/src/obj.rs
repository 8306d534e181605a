//! Wavefront OBJ + MTL export.
//!
//! Faces are written as polygons (no triangulation) grouped by material slot,
//! each slot becoming one `usemtl` section of the companion MTL file.

use crate::material::{MaterialSlot, Palette};
use crate::mesh::Mesh;
use std::io::{self, Write};

/// Write a mesh as OBJ text. `mtllib` names the companion MTL file, if any.
pub fn write_obj<W: Write>(mesh: &Mesh, mtllib: Option<&str>, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "# shipgen OBJ export")?;
    writeln!(writer, "# Vertices: {}, Faces: {}", mesh.vertex_count(), mesh.face_count())?;
    if let Some(name) = mtllib {
        writeln!(writer, "mtllib {}", name)?;
    }
    writeln!(writer, "o spaceship")?;

    for p in mesh.positions() {
        writeln!(writer, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
    }

    // One flat normal per face, in face order
    let faces: Vec<_> = mesh.faces().collect();
    for (_, face) in &faces {
        let n = mesh.vector_area(face.verts()).normalize_or_zero();
        writeln!(writer, "vn {:.6} {:.6} {:.6}", n.x, n.y, n.z)?;
    }

    for slot in MaterialSlot::ALL {
        let mut section = faces
            .iter()
            .enumerate()
            .filter(|(_, (_, face))| face.material() == slot)
            .peekable();
        if section.peek().is_none() {
            continue;
        }
        writeln!(writer, "usemtl {}", slot.name())?;
        for (normal, (_, face)) in section {
            write!(writer, "f")?;
            for v in face.verts() {
                // OBJ indices are 1-based
                write!(writer, " {}//{}", v + 1, normal + 1)?;
            }
            writeln!(writer)?;
        }
    }

    Ok(())
}

/// Write one material per slot, coloured from the palette.
pub fn write_mtl<W: Write>(palette: &Palette, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "# shipgen MTL export")?;
    for slot in MaterialSlot::ALL {
        let [dr, dg, db] = palette.diffuse(slot);
        let [er, eg, eb] = palette.emission(slot);
        writeln!(writer)?;
        writeln!(writer, "newmtl {}", slot.name())?;
        writeln!(writer, "Kd {:.4} {:.4} {:.4}", dr, dg, db)?;
        writeln!(writer, "Ke {:.4} {:.4} {:.4}", er, eg, eb)?;
        writeln!(writer, "Ns {:.1}", if slot == MaterialSlot::HullDark { 10.0 } else { 50.0 })?;
        writeln!(writer, "d 1.0")?;
        writeln!(writer, "illum 2")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn export(mesh: &Mesh) -> String {
        let mut buf = Vec::new();
        write_obj(mesh, Some("ship.mtl"), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn obj_contains_vertices_normals_and_faces() {
        let mut mesh = Mesh::new();
        let faces = mesh.add_box(Vec3::ONE).unwrap();
        mesh.set_material(faces[1], MaterialSlot::ExhaustBurn).unwrap();
        let text = export(&mesh);

        let count = |prefix: &str| text.lines().filter(|l| l.starts_with(prefix)).count();
        assert_eq!(count("v "), 8);
        assert_eq!(count("vn "), 6);
        assert_eq!(count("f "), 6);
        assert_eq!(count("usemtl "), 2);
        assert_eq!(count("mtllib ship.mtl"), 1);

        // Only the exhaust face follows its usemtl line
        let lines: Vec<&str> = text.lines().collect();
        let at = lines.iter().position(|l| *l == "usemtl exhaust_burn").unwrap();
        assert!(lines[at + 1].starts_with("f "));
        assert_eq!(lines.len(), at + 2);
    }

    #[test]
    fn obj_indices_are_one_based() {
        let mut mesh = Mesh::new();
        mesh.add_box(Vec3::ONE).unwrap();
        let text = export(&mesh);
        for line in text.lines().filter(|l| l.starts_with("f ")) {
            for part in line.split_whitespace().skip(1) {
                let idx: u32 = part.split("//").next().unwrap().parse().unwrap();
                assert!((1..=8).contains(&idx), "OBJ indices must be 1-based, got {idx}");
            }
        }
    }

    #[test]
    fn mtl_has_one_material_per_slot() {
        let mut buf = Vec::new();
        write_mtl(&Palette::default(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("newmtl ")).count(), 5);
        assert_eq!(text.lines().filter(|l| l.starts_with("Ke ")).count(), 5);
        assert!(text.contains("newmtl glow_disc"));
    }
}
