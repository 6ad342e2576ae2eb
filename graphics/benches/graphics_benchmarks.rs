use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ember_core::math::{Mat4, Vec4};
use ember_core::uniform::SharedUniform;
use ember_graphics::backend::{BufferHandle, DummyBackend, TextureHandle, VertexArrayHandle};
use ember_graphics::materials::{
    FragmentVariant, Material, RenderLayer, SurfaceType, VertexVariant,
};
use ember_graphics::mesh::{Lod, Mesh, PrimitiveTopology};
use ember_graphics::{CommandBuffer, Texture, TextureDescriptor};

const FRAGMENT: &str = "uniform vec4 tint; uniform float roughness; uniform vec4 camera.screen; void main() {}";

fn setup() -> (CommandBuffer<DummyBackend>, Arc<Material>, Vec<Arc<Texture>>, Mesh) {
    let buffer = CommandBuffer::new(DummyBackend::new());
    let material = buffer.create_material();
    material.set_shader_source(VertexVariant::Static.into(), "void main() {}");
    material.set_shader_source(VertexVariant::Instanced.into(), "void main() {}");
    material.set_shader_source(FragmentVariant::Default.into(), FRAGMENT);
    material.set_shader_source(FragmentVariant::Simple.into(), "void main() {}");
    material.set_uniform("tint", Vec4::new(1.0, 1.0, 1.0, 1.0));
    material.set_uniform("roughness", 0.5_f32);

    let textures: Vec<_> = (0..4)
        .map(|i| Arc::new(Texture::new(TextureHandle(i), TextureDescriptor::new_2d(64, 64))))
        .collect();
    for (i, texture) in textures.iter().enumerate() {
        material.set_texture(&format!("map{i}"), Some(texture));
    }

    let mesh = Mesh::new(PrimitiveTopology::TriangleList)
        .with_lod(Lod {
            vertex_count: 24,
            index_count: 36,
            vertex_array: VertexArrayHandle(1),
        })
        .with_instance_buffer(BufferHandle(2));

    (buffer, material, textures, mesh)
}

// ---------------------------------------------------------------------------
// Draw binding
// ---------------------------------------------------------------------------

fn bench_draw_mesh(c: &mut Criterion) {
    let (mut buffer, material, _textures, mesh) = setup();
    let instance = material.create_instance(SurfaceType::Static);

    c.bench_function("draw_mesh_bind_100", |b| {
        b.iter(|| {
            buffer.begin_frame();
            for _ in 0..100 {
                buffer.draw_mesh(&Mat4::identity(), &mesh, 0, RenderLayer::DEFAULT, &instance);
            }
            black_box(buffer.stats());
        });
    });
}

fn bench_draw_mesh_overrides(c: &mut Criterion) {
    let (mut buffer, material, textures, mesh) = setup();
    let tint = SharedUniform::from_value(Vec4::new(0.5, 0.5, 0.5, 1.0));
    let mut instance = material.create_instance(SurfaceType::Static);
    instance.set_vector4("tint", &tint, 1);
    instance.set_texture("map1", &textures[3], 1);

    c.bench_function("draw_mesh_bind_overrides_100", |b| {
        b.iter(|| {
            buffer.begin_frame();
            buffer.set_global_texture("map2", Some(&textures[0]));
            for i in 0..100 {
                tint.set(0, Vec4::new(i as f32 / 100.0, 0.5, 0.5, 1.0));
                buffer.draw_mesh(&Mat4::identity(), &mesh, 0, RenderLayer::DEFAULT, &instance);
            }
            black_box(buffer.stats());
        });
    });
}

fn bench_draw_mesh_instanced(c: &mut Criterion) {
    let (mut buffer, material, _textures, mesh) = setup();
    let instance = material.create_instance(SurfaceType::Instanced);
    let transforms = vec![Mat4::identity(); 256];

    c.bench_function("draw_mesh_instanced_256", |b| {
        b.iter(|| {
            buffer.begin_frame();
            buffer.draw_mesh_instanced(&transforms, &mesh, 0, RenderLayer::DEFAULT, &instance);
            black_box(buffer.stats());
        });
    });
}

// ---------------------------------------------------------------------------
// Program cache
// ---------------------------------------------------------------------------

fn bench_program_rebuild(c: &mut Criterion) {
    let (mut buffer, material, _textures, mesh) = setup();
    let instance = material.create_instance(SurfaceType::Static);

    c.bench_function("program_rebuild_4_variants", |b| {
        b.iter(|| {
            material.invalidate();
            buffer.draw_mesh(&Mat4::identity(), &mesh, 0, RenderLayer::DEFAULT, &instance);
            black_box(material.program_count());
        });
    });
}

criterion_group!(
    benches,
    bench_draw_mesh,
    bench_draw_mesh_overrides,
    bench_draw_mesh_instanced,
    bench_program_rebuild,
);
criterion_main!(benches);
