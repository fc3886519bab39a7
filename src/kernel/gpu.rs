//! wgpu compute backend.
//!
//! Agent buffers are plain storage buffers that also carry `VERTEX` usage, so a renderer
//! can draw straight from [`FlockEngine::current_position_buffer`](crate::FlockEngine::current_position_buffer).
//! The parameters block and force list are rewritten every frame and live in a
//! [`FramePool`]; each dispatch takes a slot and the queue hands it back once the device
//! has finished with it.
//!
//! [`dispatch`](FlockKernel::dispatch) waits on `Maintain::Wait` before returning, and the
//! completion callback runs inside that wait. So at most one slot is ever in use and
//! frames never overlap on this backend; the extra slots only matter to a caller that
//! submits without waiting.

use std::sync::mpsc;

use wgpu::util::DeviceExt;

use super::{DispatchError, FlockKernel, WORKGROUP_SIZE};
use crate::buffers::{BufferPair, BufferPairMut, GpuVec3};
use crate::error::{EngineError, GpuError};
use crate::force::{Force, MAX_FORCES};
use crate::frame_pool::FramePool;
use crate::params::SimulationParameters;

/// WGSL source of the flock update kernel.
pub const FLOCK_STEP_WGSL: &str = include_str!("../shaders/flock_step.wgsl");

const AGENT_BUFFER_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::STORAGE
    .union(wgpu::BufferUsages::VERTEX)
    .union(wgpu::BufferUsages::COPY_SRC)
    .union(wgpu::BufferUsages::COPY_DST);

/// Host-written inputs for one frame.
struct FrameBuffers {
    params: wgpu::Buffer,
    forces: wgpu::Buffer,
}

/// Runs `flock_step.wgsl` on the first high-performance adapter available.
///
/// Each dispatch blocks until the device is done, so only one upload slot is in flight
/// at a time.
pub struct GpuKernel {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    frames: FramePool<FrameBuffers>,
    /// Slot written by the most recent dispatch.
    last_frame: Option<usize>,
}

impl GpuKernel {
    /// Acquire a device and build the kernel with `frames_in_flight` upload slots.
    pub async fn new(frames_in_flight: usize) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using adapter {} ({:?}, {:?})",
            adapter_info.name,
            adapter_info.backend,
            adapter_info.device_type
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Flock Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Flock Step Shader"),
            source: wgpu::ShaderSource::Wgsl(FLOCK_STEP_WGSL.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Flock Step Bind Group Layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
                storage_entry(4, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Flock Step Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Flock Step Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        if let Some(err) = device.pop_error_scope().await {
            return Err(GpuError::ShaderCompilation(err.to_string()));
        }

        let frames = FramePool::with_capacity(frames_in_flight, |i| FrameBuffers {
            params: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("Flock Params {}", i)),
                size: SimulationParameters::SIZE as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            forces: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("Flock Forces {}", i)),
                size: (MAX_FORCES * std::mem::size_of::<Force>()) as u64,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
        })?;

        log::debug!("Flock kernel ready with {} frames in flight", frames_in_flight);

        Ok(Self {
            device,
            queue,
            adapter_info,
            pipeline,
            bind_group_layout,
            frames,
            last_frame: None,
        })
    }

    /// [`new`](Self::new), blocking the current thread.
    pub fn new_blocking(frames_in_flight: usize) -> Result<Self, GpuError> {
        pollster::block_on(Self::new(frames_in_flight))
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Parameters block used by the most recent dispatch, for renderers that read the
    /// model transform or point-light flag on the device.
    pub fn parameters_buffer(&self) -> Option<&wgpu::Buffer> {
        self.last_frame
            .and_then(|i| self.frames.get(i))
            .map(|frame| &frame.params)
    }

    /// Number of upload slots.
    pub fn frames_in_flight(&self) -> usize {
        self.frames.capacity()
    }

    /// Upload slots the device has not handed back yet. Zero between dispatches.
    pub fn frames_in_use(&self) -> usize {
        self.frames.in_flight()
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl FlockKernel for GpuKernel {
    type Buffer = wgpu::Buffer;

    fn name(&self) -> &'static str {
        "gpu"
    }

    fn create_buffer(&self, label: &str, data: &[GpuVec3]) -> Result<Self::Buffer, EngineError> {
        // Zero-length bindings are invalid, so an empty flock still gets one element.
        let contents: &[GpuVec3] = if data.is_empty() { &[GpuVec3::ZERO] } else { data };
        Ok(self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(contents),
            usage: AGENT_BUFFER_USAGE,
        }))
    }

    fn dispatch(
        &mut self,
        params: &SimulationParameters,
        forces: &[Force],
        read: BufferPair<'_, Self::Buffer>,
        write: BufferPairMut<'_, Self::Buffer>,
    ) -> Result<(), DispatchError> {
        let frame = self.frames.acquire();
        self.queue.write_buffer(&frame.params, 0, params.as_bytes());
        let forces = &forces[..forces.len().min(MAX_FORCES)];
        self.queue.write_buffer(&frame.forces, 0, bytemuck::cast_slice(forces));

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Flock Step Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: read.positions.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: read.velocities.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: frame.forces.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: write.positions.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 4, resource: write.velocities.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 5, resource: frame.params.as_entire_binding() },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Flock Step Encoder"),
        });

        let agents = params.agent_count() as u32;
        if agents > 0 {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Flock Step Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(agents.div_ceil(WORKGROUP_SIZE), 1, 1);
        }

        self.queue.submit(Some(encoder.finish()));

        let index = frame.index();
        self.queue.on_submitted_work_done(move || frame.release());
        self.device.poll(wgpu::Maintain::Wait);

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(DispatchError(err.to_string()));
        }

        self.last_frame = Some(index);
        Ok(())
    }

    fn read_buffer(&self, buffer: &Self::Buffer, len: usize) -> Result<Vec<GpuVec3>, EngineError> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let size = (len * std::mem::size_of::<GpuVec3>()) as u64;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Flock Readback Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Flock Readback Encoder"),
        });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        receiver
            .recv()
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

        let data = {
            let mapped = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, GpuVec3>(&mapped).to_vec()
        };
        staging.unmap();

        Ok(data)
    }
}
