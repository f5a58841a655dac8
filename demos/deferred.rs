//! Deferred-shading shaped graph driven against the headless device.
//!
//! Builds a shadow + gbuffer + lighting + bloom pipeline compositing into an
//! externally bound backbuffer, then prints the schedule, the statistics,
//! and the Graphviz dump. Run with `RUST_LOG=trace` to watch allocation and
//! execution traffic.

use framegraph::{
    GraphBuilder, HeadlessDevice, RenderGraph, ResourceDescriptor, ResourceHandle,
    TextureDescriptor, TextureFormat, TextureHandle, TextureUsage,
};

fn main() {
    env_logger::init();
    framegraph::init();

    let mut device = HeadlessDevice::new();
    let mut graph = RenderGraph::new();

    // The backbuffer comes from the presentation layer; the graph must not
    // allocate or free it.
    let backbuffer = ResourceHandle::Texture(TextureHandle::from_raw(0xBAC));
    build_frame(&mut graph, backbuffer).expect("graph construction failed");

    graph.compile(&mut device).expect("compilation failed");
    graph.execute(&mut device).expect("execution failed");

    println!("schedule: {:?}", graph.execution_order());
    println!("stats:    {:?}", graph.stats());
    println!("device:   {} textures, {} buffers, {} bytes",
        device.live_textures(),
        device.live_buffers(),
        device.allocated_bytes(),
    );
    println!("\n{}", graph.export_dot());

    graph.clear(&mut device);
    assert_eq!(device.live_textures(), 0);
}

fn build_frame(
    graph: &mut RenderGraph,
    backbuffer: ResourceHandle,
) -> Result<(), framegraph::GraphError> {
    let attachment = TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING;
    let mut builder = GraphBuilder::new(graph);

    builder
        .external("backbuffer", backbuffer)
        .resource(
            ResourceDescriptor::texture(
                "shadow_map",
                TextureDescriptor::new_2d(2048, 2048, TextureFormat::Depth32Float, attachment),
            )
            .transient(),
        )?
        .resource(
            ResourceDescriptor::texture(
                "gbuffer",
                TextureDescriptor::new_2d(1920, 1080, TextureFormat::Rgba16Float, attachment),
            )
            .transient(),
        )?
        .resource(
            ResourceDescriptor::texture(
                "lit",
                TextureDescriptor::new_2d(1920, 1080, TextureFormat::Rgba16Float, attachment),
            )
            .transient(),
        )?
        .resource(
            ResourceDescriptor::texture(
                "bright",
                TextureDescriptor::new_2d(960, 540, TextureFormat::Rgba16Float, attachment),
            )
            .transient(),
        )?
        // Written by a debug pass nobody consumes; the compiler culls it.
        .resource(
            ResourceDescriptor::texture(
                "wireframe_vis",
                TextureDescriptor::new_2d(1920, 1080, TextureFormat::Rgba8Unorm, attachment),
            )
            .transient(),
        )?;

    builder
        .pass("shadow")?
        .write("shadow_map")
        .callback(|ctx| {
            log::info!("shadow map -> {:?}", ctx.texture("shadow_map"));
            Ok(())
        });
    builder
        .pass("geometry")?
        .write("gbuffer")
        .callback(|ctx| {
            log::info!("gbuffer -> {:?}", ctx.texture("gbuffer"));
            Ok(())
        });
    builder
        .pass("lighting")?
        .read("gbuffer")
        .read("shadow_map")
        .write("lit")
        .callback(|ctx| {
            log::info!("lit -> {:?}", ctx.texture("lit"));
            Ok(())
        });
    builder.pass("wireframe")?.write("wireframe_vis");
    builder.pass("bloom")?.read("lit").write("bright");
    builder
        .pass("composite")?
        .read("lit")
        .read("bright")
        .write("backbuffer")
        .callback(|ctx| {
            log::info!("presenting {:?}", ctx.texture("backbuffer"));
            Ok(())
        });

    Ok(())
}
