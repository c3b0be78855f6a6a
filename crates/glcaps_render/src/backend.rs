//! wgpu-backed driver
//!
//! Serves every candidate through a wgpu adapter. GL candidates go through
//! wgpu's GL backend; the native candidate maps to Vulkan, Metal or Dx12.
//! Adapter limits, features and downlevel flags are exposed under their GL
//! enum names so the reference database stays API-agnostic.

use crate::battery::{
    ARB_BPTC, ARB_COMPUTE_SHADER, ARB_ES3_COMPATIBILITY, ARB_IMAGE_LOAD_STORE, ARB_RGTC, ARB_SSBO,
    ARB_VERTEX_ATTRIB_BINDING, EXT_ANISOTROPIC, EXT_NORM16, EXT_S3TC, KHR_ASTC_LDR,
};
use crate::driver::{Driver, DriverContext, DriverError, QueryError};
use glcaps_core::{Api, ApiVersion, ContextConfiguration, DeviceIdentity, FormatSupport};
use wgpu::{
    AstcBlock, AstcChannel, Backends, DownlevelFlags, Features, Gles3MinorVersion, TextureFormat,
    TextureFormatFeatureFlags, TextureUsages,
};

/// PCI vendor ids as reported by the adapter
fn vendor_name(id: u32) -> Option<&'static str> {
    Some(match id {
        0x1002 => "AMD",
        0x10DE => "NVIDIA",
        0x8086 => "Intel",
        0x13B5 => "ARM",
        0x5143 => "Qualcomm",
        0x1010 => "Imagination Technologies",
        0x106B => "Apple",
        0x1414 => "Microsoft",
        0x10005 => "Mesa",
        _ => return None,
    })
}

fn backends_for(api: Api) -> Backends {
    match api {
        Api::Gl | Api::GlEs => Backends::GL,
        Api::Vulkan => Backends::VULKAN,
        Api::Metal => Backends::METAL,
        Api::Dx12 => Backends::DX12,
    }
}

fn gles_minor(config: &ContextConfiguration) -> Gles3MinorVersion {
    if config.api != Api::GlEs || config.version.major != 3 {
        return Gles3MinorVersion::Automatic;
    }
    match config.version.minor {
        0 => Gles3MinorVersion::Version0,
        1 => Gles3MinorVersion::Version1,
        2 => Gles3MinorVersion::Version2,
        _ => Gles3MinorVersion::Automatic,
    }
}

/// Creates one wgpu instance and adapter per requested context
pub struct WgpuDriver {
    power_preference: wgpu::PowerPreference,
}

impl WgpuDriver {
    pub fn new() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
        }
    }

    pub fn with_power_preference(power_preference: wgpu::PowerPreference) -> Self {
        Self { power_preference }
    }

    fn check_version(config: &ContextConfiguration, reported: &str) -> Result<(), DriverError> {
        if !config.api.is_gl() {
            return Ok(());
        }
        let is_es = reported.contains("OpenGL ES");
        let mismatch = DriverError::VersionUnavailable {
            requested: config.label(),
            provided: reported.to_string(),
        };
        if is_es != (config.api == Api::GlEs) {
            return Err(mismatch);
        }
        match ApiVersion::parse_loose(reported) {
            Some(version) if version >= config.version => Ok(()),
            _ => Err(mismatch),
        }
    }
}

impl Default for WgpuDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for WgpuDriver {
    type Context = WgpuContext;

    fn create_context(&mut self, config: &ContextConfiguration) -> Result<WgpuContext, DriverError> {
        let mut flags = wgpu::InstanceFlags::empty();
        if config.flags.debug {
            flags |= wgpu::InstanceFlags::DEBUG | wgpu::InstanceFlags::VALIDATION;
        }
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: backends_for(config.api),
            flags,
            gles_minor_version: gles_minor(config),
            ..Default::default()
        });

        let power_preference = if config.flags.low_power {
            wgpu::PowerPreference::LowPower
        } else {
            self.power_preference
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| DriverError::ApiUnavailable(config.label()))?;

        let info = adapter.get_info();
        tracing::debug!(adapter = %info.name, backend = ?info.backend, "Adapter found");

        let version_string = if !config.api.is_gl() {
            format!("{} {} {}", config.api.label(), config.version, info.driver_info)
                .trim_end()
                .to_string()
        } else if ApiVersion::parse_loose(&info.driver_info).is_some() {
            info.driver_info.clone()
        } else {
            // Some GL adapters leave the version out of the adapter info; the
            // GL backend only ever creates ES contexts then.
            tracing::debug!(adapter = %info.name, "GL version not reported, assuming requested ES version");
            format!("OpenGL ES {} (assumed)", config.version)
        };
        Self::check_version(config, &version_string)?;

        Ok(WgpuContext {
            adapter,
            _instance: instance,
            info,
            version_string,
        })
    }
}

/// One adapter standing in for a live driver context
pub struct WgpuContext {
    // Drop order: adapter before the instance that produced it
    adapter: wgpu::Adapter,
    _instance: wgpu::Instance,
    info: wgpu::AdapterInfo,
    version_string: String,
}

fn to_i32(value: u32) -> Result<i32, QueryError> {
    i32::try_from(value).map_err(|_| QueryError::OutOfRange {
        value: value.to_string(),
    })
}

/// Adapter limits that correspond one to one to a GL query. Anything wgpu
/// does not report directly (context flags, combined-stage totals, viewport
/// bounds) is left out and ends up unavailable.
fn limit_value(limits: &wgpu::Limits, name: &str) -> Option<u32> {
    let value = match name {
        "GL_MAX_TEXTURE_SIZE" | "GL_MAX_CUBE_MAP_TEXTURE_SIZE" | "GL_MAX_RENDERBUFFER_SIZE" => {
            limits.max_texture_dimension_2d
        }
        "GL_MAX_3D_TEXTURE_SIZE" => limits.max_texture_dimension_3d,
        "GL_MAX_ARRAY_TEXTURE_LAYERS" => limits.max_texture_array_layers,
        "GL_MAX_COLOR_ATTACHMENTS" | "GL_MAX_DRAW_BUFFERS" => limits.max_color_attachments,
        "GL_MAX_VERTEX_ATTRIBS" => limits.max_vertex_attributes,
        "GL_MAX_VERTEX_ATTRIB_STRIDE" => limits.max_vertex_buffer_array_stride,
        "GL_MAX_VERTEX_ATTRIB_BINDINGS" => limits.max_vertex_buffers,
        "GL_UNIFORM_BUFFER_OFFSET_ALIGNMENT" => limits.min_uniform_buffer_offset_alignment,
        "GL_SHADER_STORAGE_BUFFER_OFFSET_ALIGNMENT" => limits.min_storage_buffer_offset_alignment,
        "GL_MAX_VERTEX_UNIFORM_BLOCKS"
        | "GL_MAX_FRAGMENT_UNIFORM_BLOCKS"
        | "GL_MAX_COMPUTE_UNIFORM_BLOCKS" => limits.max_uniform_buffers_per_shader_stage,
        "GL_MAX_FRAGMENT_SHADER_STORAGE_BLOCKS" | "GL_MAX_COMPUTE_SHADER_STORAGE_BLOCKS" => {
            limits.max_storage_buffers_per_shader_stage
        }
        "GL_MAX_TEXTURE_IMAGE_UNITS" | "GL_MAX_VERTEX_TEXTURE_IMAGE_UNITS" => {
            limits.max_sampled_textures_per_shader_stage
        }
        "GL_MAX_IMAGE_UNITS" => limits.max_storage_textures_per_shader_stage,
        "GL_MAX_VARYING_COMPONENTS" => limits.max_inter_stage_shader_components,
        "GL_MAX_COMPUTE_WORK_GROUP_INVOCATIONS" => limits.max_compute_invocations_per_workgroup,
        "GL_MAX_COMPUTE_SHARED_MEMORY_SIZE" => limits.max_compute_workgroup_storage_size,
        "GL_MAX_UNIFORM_BLOCK_SIZE" => limits.max_uniform_buffer_binding_size,
        "GL_MAX_SHADER_STORAGE_BLOCK_SIZE" => limits.max_storage_buffer_binding_size,
        _ => return None,
    };
    Some(value)
}

fn limit_list(limits: &wgpu::Limits, name: &str) -> Option<[u32; 3]> {
    match name {
        "GL_MAX_COMPUTE_WORK_GROUP_SIZE" => Some([
            limits.max_compute_workgroup_size_x,
            limits.max_compute_workgroup_size_y,
            limits.max_compute_workgroup_size_z,
        ]),
        "GL_MAX_COMPUTE_WORK_GROUP_COUNT" => Some([limits.max_compute_workgroups_per_dimension; 3]),
        _ => None,
    }
}

fn integer_limit(limits: &wgpu::Limits, name: &str) -> Result<i32, QueryError> {
    limit_value(limits, name).ok_or(QueryError::Unsupported).and_then(to_i32)
}

impl WgpuContext {
    fn max_samples(&self) -> i32 {
        let flags = self
            .adapter
            .get_texture_format_features(TextureFormat::Rgba8Unorm)
            .flags;
        [
            (TextureFormatFeatureFlags::MULTISAMPLE_X16, 16),
            (TextureFormatFeatureFlags::MULTISAMPLE_X8, 8),
            (TextureFormatFeatureFlags::MULTISAMPLE_X4, 4),
            (TextureFormatFeatureFlags::MULTISAMPLE_X2, 2),
        ]
        .into_iter()
        .find(|(flag, _)| flags.contains(*flag))
        .map_or(1, |(_, samples)| samples)
    }

    fn reported_version(&self) -> Result<ApiVersion, QueryError> {
        ApiVersion::parse_loose(&self.version_string).ok_or(QueryError::Unsupported)
    }
}

fn texture_format(name: &str) -> Option<TextureFormat> {
    let astc = |block| TextureFormat::Astc {
        block,
        channel: AstcChannel::Unorm,
    };
    Some(match name {
        "GL_R8" => TextureFormat::R8Unorm,
        "GL_RG8" => TextureFormat::Rg8Unorm,
        "GL_RGBA8" => TextureFormat::Rgba8Unorm,
        "GL_SRGB8_ALPHA8" => TextureFormat::Rgba8UnormSrgb,
        "GL_R16F" => TextureFormat::R16Float,
        "GL_RG16F" => TextureFormat::Rg16Float,
        "GL_RGBA16F" => TextureFormat::Rgba16Float,
        "GL_R32F" => TextureFormat::R32Float,
        "GL_RG32F" => TextureFormat::Rg32Float,
        "GL_RGBA32F" => TextureFormat::Rgba32Float,
        "GL_R32UI" => TextureFormat::R32Uint,
        "GL_RGBA32UI" => TextureFormat::Rgba32Uint,
        "GL_RGB10_A2" => TextureFormat::Rgb10a2Unorm,
        "GL_RGB9_E5" => TextureFormat::Rgb9e5Ufloat,
        "GL_R16" => TextureFormat::R16Unorm,
        "GL_RGBA16" => TextureFormat::Rgba16Unorm,
        "GL_DEPTH_COMPONENT16" => TextureFormat::Depth16Unorm,
        "GL_DEPTH_COMPONENT24" => TextureFormat::Depth24Plus,
        "GL_DEPTH_COMPONENT32F" => TextureFormat::Depth32Float,
        "GL_DEPTH24_STENCIL8" => TextureFormat::Depth24PlusStencil8,
        "GL_DEPTH32F_STENCIL8" => TextureFormat::Depth32FloatStencil8,
        "GL_COMPRESSED_RGBA_S3TC_DXT1_EXT" => TextureFormat::Bc1RgbaUnorm,
        "GL_COMPRESSED_RGBA_S3TC_DXT5_EXT" => TextureFormat::Bc3RgbaUnorm,
        "GL_COMPRESSED_RED_RGTC1" => TextureFormat::Bc4RUnorm,
        "GL_COMPRESSED_RG_RGTC2" => TextureFormat::Bc5RgUnorm,
        "GL_COMPRESSED_RGBA_BPTC_UNORM" => TextureFormat::Bc7RgbaUnorm,
        "GL_COMPRESSED_RGB8_ETC2" => TextureFormat::Etc2Rgb8Unorm,
        "GL_COMPRESSED_RGBA8_ETC2_EAC" => TextureFormat::Etc2Rgba8Unorm,
        "GL_COMPRESSED_RGBA_ASTC_4x4_KHR" => astc(AstcBlock::B4x4),
        "GL_COMPRESSED_RGBA_ASTC_8x8_KHR" => astc(AstcBlock::B8x8),
        _ => return None,
    })
}

/// Extension names implied by adapter features and downlevel flags
fn implied_extensions(features: Features, downlevel: DownlevelFlags, limits: &wgpu::Limits) -> Vec<String> {
    let mut extensions = vec![ARB_VERTEX_ATTRIB_BINDING];
    let feature_map: &[(Features, &[&str])] = &[
        (Features::TEXTURE_COMPRESSION_BC, &[EXT_S3TC, ARB_RGTC, ARB_BPTC]),
        (Features::TEXTURE_COMPRESSION_ETC2, &[ARB_ES3_COMPATIBILITY]),
        (Features::TEXTURE_COMPRESSION_ASTC, &[KHR_ASTC_LDR]),
        (Features::TEXTURE_FORMAT_16BIT_NORM, &[EXT_NORM16]),
        (Features::FLOAT32_FILTERABLE, &["GL_OES_texture_float_linear"]),
        (Features::DEPTH_CLIP_CONTROL, &["GL_ARB_depth_clamp"]),
        (Features::MULTI_DRAW_INDIRECT, &["GL_ARB_multi_draw_indirect"]),
        (Features::SHADER_F64, &["GL_ARB_gpu_shader_fp64"]),
        (Features::TIMESTAMP_QUERY, &["GL_ARB_timer_query"]),
        (Features::PIPELINE_STATISTICS_QUERY, &["GL_ARB_pipeline_statistics_query"]),
    ];
    for (feature, names) in feature_map {
        if features.contains(*feature) {
            extensions.extend_from_slice(names);
        }
    }
    let downlevel_map: &[(DownlevelFlags, &str)] = &[
        (DownlevelFlags::COMPUTE_SHADERS, ARB_COMPUTE_SHADER),
        (DownlevelFlags::ANISOTROPIC_FILTERING, EXT_ANISOTROPIC),
        (DownlevelFlags::CUBE_ARRAY_TEXTURES, "GL_ARB_texture_cube_map_array"),
        (DownlevelFlags::INDEPENDENT_BLEND, "GL_ARB_draw_buffers_blend"),
        (DownlevelFlags::BASE_VERTEX, "GL_ARB_draw_elements_base_vertex"),
        (DownlevelFlags::INDIRECT_EXECUTION, "GL_ARB_draw_indirect"),
    ];
    for (flag, name) in downlevel_map {
        if downlevel.contains(*flag) {
            extensions.push(name);
        }
    }
    if limits.max_storage_buffers_per_shader_stage > 0 {
        extensions.push(ARB_SSBO);
    }
    if limits.max_storage_textures_per_shader_stage > 0 {
        extensions.push(ARB_IMAGE_LOAD_STORE);
    }
    extensions.into_iter().map(String::from).collect()
}

impl DriverContext for WgpuContext {
    fn identity(&self) -> DeviceIdentity {
        let vendor = vendor_name(self.info.vendor)
            .map(String::from)
            .or_else(|| (!self.info.driver.is_empty()).then(|| self.info.driver.clone()))
            .unwrap_or_else(|| format!("0x{:04X}", self.info.vendor));
        let renderer = if self.info.name.is_empty() {
            "unknown".to_string()
        } else {
            self.info.name.clone()
        };
        let driver_version = match (self.info.driver.is_empty(), self.info.driver_info.is_empty()) {
            (_, true) => "unknown".to_string(),
            (true, false) => self.info.driver_info.clone(),
            (false, false) => format!("{} {}", self.info.driver, self.info.driver_info),
        };
        DeviceIdentity {
            vendor,
            renderer,
            driver_version,
            vendor_id: (self.info.vendor != 0).then_some(self.info.vendor),
            device_id: (self.info.device != 0).then_some(self.info.device),
            backend: format!("{:?}", self.info.backend),
        }
    }

    fn version_string(&self) -> String {
        self.version_string.clone()
    }

    fn extensions(&self) -> Result<Vec<String>, QueryError> {
        let downlevel = self.adapter.get_downlevel_capabilities();
        Ok(implied_extensions(
            self.adapter.features(),
            downlevel.flags,
            &self.adapter.limits(),
        ))
    }

    fn get_string(&self, name: &str) -> Result<String, QueryError> {
        match name {
            "GL_VENDOR" => Ok(self.identity().vendor),
            "GL_RENDERER" => Ok(self.identity().renderer),
            "GL_VERSION" => Ok(self.version_string.clone()),
            "GL_SHADING_LANGUAGE_VERSION" => Err(QueryError::Unsupported),
            _ => Err(QueryError::InvalidEnum),
        }
    }

    fn get_integer(&self, name: &str) -> Result<i32, QueryError> {
        match name {
            "GL_MAJOR_VERSION" => return to_i32(self.reported_version()?.major),
            "GL_MINOR_VERSION" => return to_i32(self.reported_version()?.minor),
            "GL_MAX_SAMPLES" => return Ok(self.max_samples()),
            _ => {}
        }
        integer_limit(&self.adapter.limits(), name)
    }

    fn get_integer64(&self, name: &str) -> Result<i64, QueryError> {
        match name {
            "GL_MAX_ELEMENT_INDEX" => {
                let full = self
                    .adapter
                    .get_downlevel_capabilities()
                    .flags
                    .contains(DownlevelFlags::FULL_DRAW_INDEX_UINT32);
                Ok(if full { i64::from(u32::MAX) } else { (1 << 24) - 1 })
            }
            _ => limit_value(&self.adapter.limits(), name)
                .map(i64::from)
                .ok_or(QueryError::Unsupported),
        }
    }

    fn get_float(&self, name: &str) -> Result<f32, QueryError> {
        match name {
            "GL_MAX_TEXTURE_MAX_ANISOTROPY_EXT" => {
                let flags = self.adapter.get_downlevel_capabilities().flags;
                // wgpu caps anisotropy_clamp at 16 wherever filtering is supported
                if flags.contains(DownlevelFlags::ANISOTROPIC_FILTERING) {
                    Ok(16.0)
                } else {
                    Err(QueryError::Unsupported)
                }
            }
            _ => Err(QueryError::Unsupported),
        }
    }

    fn get_boolean(&self, name: &str) -> Result<bool, QueryError> {
        match name {
            // Shaders are always compiled from source through naga
            "GL_SHADER_COMPILER" => Ok(true),
            _ => Err(QueryError::Unsupported),
        }
    }

    fn get_integer_indexed(&self, name: &str, index: u32) -> Result<i32, QueryError> {
        let values = limit_list(&self.adapter.limits(), name).ok_or(QueryError::Unsupported)?;
        let value = values
            .get(index as usize)
            .copied()
            .ok_or(QueryError::InvalidIndex(index))?;
        to_i32(value)
    }

    fn format_support(&self, format: &str) -> Result<FormatSupport, QueryError> {
        let format = texture_format(format).ok_or(QueryError::InvalidEnum)?;
        if !self.adapter.features().contains(format.required_features()) {
            return Ok(FormatSupport::default());
        }
        let features = self.adapter.get_texture_format_features(format);
        Ok(FormatSupport {
            sampled: features.allowed_usages.contains(TextureUsages::TEXTURE_BINDING),
            filterable: features.flags.contains(TextureFormatFeatureFlags::FILTERABLE),
            renderable: features.allowed_usages.contains(TextureUsages::RENDER_ATTACHMENT),
            blendable: features.flags.contains(TextureFormatFeatureFlags::BLENDABLE),
            storage: features.allowed_usages.contains(TextureUsages::STORAGE_BINDING),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glcaps_core::Profile;
    use crate::battery::{Query, BATTERY};

    #[test]
    fn test_every_battery_format_maps_to_wgpu() {
        for descriptor in BATTERY.iter().filter(|d| d.query == Query::Format) {
            assert!(texture_format(descriptor.name).is_some(), "{}", descriptor.name);
        }
    }

    #[test]
    fn test_version_check() {
        let desktop = ContextConfiguration::new(Api::Gl, 4, 6, Profile::ForwardCompatible);
        let es = ContextConfiguration::new(Api::GlEs, 3, 0, Profile::Core);
        assert!(WgpuDriver::check_version(&desktop, "4.6.0 NVIDIA 550.54").is_ok());
        assert!(WgpuDriver::check_version(&desktop, "3.3.0 Mesa").is_err());
        assert!(WgpuDriver::check_version(&desktop, "OpenGL ES 3.2 Mesa 24.0").is_err());
        assert!(WgpuDriver::check_version(&es, "OpenGL ES 3.2 Mesa 24.0").is_ok());
        assert!(WgpuDriver::check_version(&es, "garbage").is_err());
        let native = ContextConfiguration::new(Api::Vulkan, 1, 0, Profile::Core);
        assert!(WgpuDriver::check_version(&native, "").is_ok());
    }

    #[test]
    fn test_implied_extensions() {
        let limits = wgpu::Limits::downlevel_webgl2_defaults();
        let extensions = implied_extensions(
            Features::TEXTURE_COMPRESSION_BC,
            DownlevelFlags::ANISOTROPIC_FILTERING,
            &limits,
        );
        for expected in [EXT_S3TC, ARB_RGTC, ARB_BPTC, EXT_ANISOTROPIC] {
            assert!(extensions.iter().any(|e| e == expected), "{expected}");
        }
        // WebGL2 limits have no storage buffers
        assert!(!extensions.iter().any(|e| e == ARB_SSBO));
        assert!(!extensions.iter().any(|e| e == ARB_COMPUTE_SHADER));
    }

    #[test]
    fn test_only_direct_limits_are_reported() {
        let limits = wgpu::Limits::default();
        assert_eq!(integer_limit(&limits, "GL_MAX_TEXTURE_SIZE"), to_i32(limits.max_texture_dimension_2d));
        assert_eq!(
            integer_limit(&limits, "GL_MAX_TEXTURE_IMAGE_UNITS"),
            to_i32(limits.max_sampled_textures_per_shader_stage)
        );
        for name in [
            "GL_CONTEXT_FLAGS",
            "GL_CONTEXT_PROFILE_MASK",
            "GL_MAX_COMBINED_TEXTURE_IMAGE_UNITS",
            "GL_MAX_COMBINED_SHADER_STORAGE_BLOCKS",
            "GL_MAX_FRAMEBUFFER_WIDTH",
            "GL_MAX_FRAMEBUFFER_HEIGHT",
            "GL_MAX_UNIFORM_BUFFER_BINDINGS",
            "GL_MAX_GEOMETRY_OUTPUT_VERTICES",
        ] {
            assert_eq!(integer_limit(&limits, name), Err(QueryError::Unsupported), "{name}");
        }
        assert_eq!(limit_list(&limits, "GL_MAX_VIEWPORT_DIMS"), None);
        assert_eq!(
            limit_list(&limits, "GL_MAX_COMPUTE_WORK_GROUP_SIZE"),
            Some([
                limits.max_compute_workgroup_size_x,
                limits.max_compute_workgroup_size_y,
                limits.max_compute_workgroup_size_z,
            ])
        );
    }

    #[test]
    fn test_vendor_names() {
        assert_eq!(vendor_name(0x10DE), Some("NVIDIA"));
        assert_eq!(vendor_name(0x1234), None);
    }
}
