use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ember_core::math::{Mat4, Vec3};
use ember_core::uniform::{SharedUniform, UniformSource};
use ember_core::variant::{Variant, parse_variant_map};

const MATERIAL_DOCUMENT: &str = r#"{
    "Properties": List([Int(0), Bool(false), Int(1), Int(0), Int(1), Bool(true), Bool(true)]),
    "Textures": List([
        List([String(""), Int(6), String("mainTexture"), Int(0)]),
        List([String(""), Int(7), String("normalsMap"), Int(0)]),
    ]),
    "Uniforms": List([List([Vector4((1.0, 1.0, 1.0, 1.0)), Int(16), String("tint")])]),
}"#;

// ---------------------------------------------------------------------------
// Serialized data
// ---------------------------------------------------------------------------

fn bench_parse_material_document(c: &mut Criterion) {
    c.bench_function("parse_material_document", |b| {
        b.iter(|| parse_variant_map(black_box(MATERIAL_DOCUMENT)));
    });
}

fn bench_variant_coercion(c: &mut Criterion) {
    let value = Variant::Vector4([0.2, 0.4, 0.6, 1.0]);
    c.bench_function("variant_to_vector4", |b| {
        b.iter(|| black_box(&value).to_vector4());
    });
}

// ---------------------------------------------------------------------------
// Live uniform reads
// ---------------------------------------------------------------------------

fn bench_skinning_palette_read(c: &mut Criterion) {
    let palette = SharedUniform::new(vec![Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0)); 64]);
    let source: Box<dyn UniformSource> = Box::new(palette.clone());
    c.bench_function("skinning_palette_read_64", |b| {
        b.iter(|| {
            let mut len = 0;
            source.with_data(&mut |data| len = data.len());
            black_box(len)
        });
    });
}

criterion_group!(
    benches,
    bench_parse_material_document,
    bench_variant_coercion,
    bench_skinning_palette_read
);
criterion_main!(benches);
