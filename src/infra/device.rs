// ============================================================
// Layer 6 — Compute Device Selection
// ============================================================
// Resolved once at startup and passed down explicitly:
//
//   auto → GPU if one is detected, else CPU
//   gpu  → GPU if one is detected, else CPU with a warning
//   cpu  → CPU
//
// "Detected" means the driver check finds hardware AND a wgpu
// adapter actually runs a one-element tensor op.
//
// CPU runs Burn's NdArray backend, GPU runs Wgpu. Training wraps
// either in Autodiff.

use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    tensor::Tensor,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{fmt, panic, path::Path};

pub type CpuBackend      = NdArray<f32>;
pub type GpuBackend      = Wgpu;
pub type CpuTrainBackend = Autodiff<CpuBackend>;
pub type GpuTrainBackend = Autodiff<GpuBackend>;

/// What the user asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cpu,
    Gpu,
}

/// What the run actually uses.
#[derive(Debug, Clone)]
pub enum ComputeDevice {
    Cpu(NdArrayDevice),
    Gpu(WgpuDevice),
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeDevice::Cpu(_) => write!(f, "CPU (ndarray)"),
            ComputeDevice::Gpu(d) => write!(f, "GPU (wgpu {d:?})"),
        }
    }
}

impl ComputeDevice {
    /// Pick the device for this run. Never fails: a missing GPU
    /// degrades to CPU.
    pub fn resolve(preference: DevicePreference) -> Self {
        Self::resolve_with(preference, gpu_available(), wgpu_adapter_works)
    }

    fn resolve_with(
        preference: DevicePreference,
        hardware:   bool,
        adapter:    impl FnOnce() -> bool,
    ) -> Self {
        let usable = preference != DevicePreference::Cpu && hardware && adapter();
        let device = match (preference, hardware) {
            (DevicePreference::Cpu, _) => ComputeDevice::Cpu(NdArrayDevice::Cpu),
            (_, true) if usable        => ComputeDevice::Gpu(WgpuDevice::default()),
            (_, true) => {
                tracing::warn!("GPU detected but no usable wgpu adapter, falling back to CPU");
                ComputeDevice::Cpu(NdArrayDevice::Cpu)
            }
            (DevicePreference::Gpu, false) => {
                tracing::warn!("GPU requested but none detected, falling back to CPU");
                ComputeDevice::Cpu(NdArrayDevice::Cpu)
            }
            (DevicePreference::Auto, false) => {
                tracing::warn!("No GPU detected, using CPU");
                ComputeDevice::Cpu(NdArrayDevice::Cpu)
            }
        };
        tracing::info!("Compute device: {device}");
        device
    }
}

// ─── GPU detection ────────────────────────────────────────────────────────────
fn gpu_available() -> bool {
    has_nvidia_gpu() || has_amd_gpu() || has_render_node()
}

fn has_nvidia_gpu() -> bool {
    Path::new("/proc/driver/nvidia/version").exists()
        || Path::new("/dev/nvidia0").exists()
        || std::env::var_os("CUDA_VISIBLE_DEVICES").is_some_and(|v| !v.is_empty())
}

fn has_amd_gpu() -> bool {
    Path::new("/sys/module/amdgpu").exists()
        || std::env::var_os("HIP_VISIBLE_DEVICES").is_some_and(|v| !v.is_empty())
}

/// Any DRM render node (Intel/AMD/NVIDIA via Vulkan on Linux).
fn has_render_node() -> bool {
    Path::new("/dev/dri/renderD128").exists()
}

/// wgpu panics during adapter selection when no driver backs the
/// hardware, so run one op and catch that.
fn wgpu_adapter_works() -> bool {
    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let outcome = panic::catch_unwind(|| {
        let device = WgpuDevice::default();
        let sum    = Tensor::<GpuBackend, 1>::from_floats([1.0], &device) + 1.0;
        sum.into_scalar()
    });
    panic::set_hook(hook);
    outcome.is_ok()
}
