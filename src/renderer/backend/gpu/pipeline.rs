use std::collections::HashMap;

use crate::renderer::{BlendMode, PipelineState, Vertex};

use super::pipeline_builder::PipelineBuilder;

pub(crate) const BACK_BUFFER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Game shader pipelines, one per distinct [`PipelineState`], created on
/// first use.
pub(crate) struct GamePipelines {
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineState, wgpu::RenderPipeline>,
}

impl GamePipelines {
    pub(crate) fn new(
        device: &wgpu::Device,
        uniform_layout: &wgpu::BindGroupLayout,
        atlas_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Game Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shader/game.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Game Pipeline Layout"),
            bind_group_layouts: &[uniform_layout, atlas_layout],
            push_constant_ranges: &[],
        });

        Self {
            shader,
            layout,
            pipelines: HashMap::new(),
        }
    }

    pub(crate) fn ensure(&mut self, device: &wgpu::Device, state: PipelineState) {
        if self.pipelines.contains_key(&state) {
            return;
        }
        log::info!("Creating game pipeline for {:?}", state);
        let pipeline = self.create_pipeline(device, state);
        self.pipelines.insert(state, pipeline);
    }

    pub(crate) fn get(&self, state: &PipelineState) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(state)
    }

    fn create_pipeline(&self, device: &wgpu::Device, state: PipelineState) -> wgpu::RenderPipeline {
        let (depth_write, depth_compare) = depth_state(&state);
        PipelineBuilder::new(device, &self.layout, &self.shader)
            .with_label("GamePipeline")
            .with_vertex_buffer(Vertex::layout())
            .with_color_target(BACK_BUFFER_FORMAT, Some(blend_state(state.blend_mode)))
            .with_depth_stencil_biased(
                DEPTH_FORMAT,
                depth_write,
                depth_compare,
                depth_bias_constant(&state),
                state.depth_offset(),
            )
            .with_cull_mode(state.cull_backface.then_some(wgpu::Face::Back))
            .build()
    }
}

pub(crate) fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    let dst_factor = match mode {
        BlendMode::Normal => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendMode::Lighter => wgpu::BlendFactor::One,
    };
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

/// With depth testing off nothing is written either, matching GL.
pub(crate) fn depth_state(state: &PipelineState) -> (bool, wgpu::CompareFunction) {
    if state.depth_test {
        (state.depth_write, wgpu::CompareFunction::LessEqual)
    } else {
        (false, wgpu::CompareFunction::Always)
    }
}

fn depth_bias_constant(state: &PipelineState) -> i32 {
    if state.depth_offset() == 0.0 {
        0
    } else {
        1
    }
}
