//! The fixed probe battery
//!
//! Every capability the prober reads, with its declared query type and the
//! extension that gates it, if any. Names follow the GL enum spelling used by
//! the reference database.

use glcaps_core::{Category, ValueKind};

/// How a capability is read from the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    String,
    /// 32-bit integer query
    Integer,
    /// 64-bit integer query
    Integer64,
    Float,
    Boolean,
    /// Integer query over indices `0..count`
    Indexed { count: u32 },
    Format,
}

impl Query {
    pub fn kind(&self) -> ValueKind {
        match self {
            Query::String => ValueKind::String,
            Query::Integer => ValueKind::Integer,
            Query::Integer64 => ValueKind::Integer64,
            Query::Float => ValueKind::Float,
            Query::Boolean => ValueKind::Boolean,
            Query::Indexed { .. } => ValueKind::Indexed,
            Query::Format => ValueKind::Format,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeDescriptor {
    pub name: &'static str,
    pub category: Category,
    pub query: Query,
    /// Extension that must be advertised before the query is issued
    pub requires: Option<&'static str>,
}

impl ProbeDescriptor {
    pub const fn new(name: &'static str, category: Category, query: Query) -> Self {
        Self {
            name,
            category,
            query,
            requires: None,
        }
    }

    pub const fn requires(mut self, extension: &'static str) -> Self {
        self.requires = Some(extension);
        self
    }
}

pub const ARB_COMPUTE_SHADER: &str = "GL_ARB_compute_shader";
pub const ARB_SSBO: &str = "GL_ARB_shader_storage_buffer_object";
pub const ARB_IMAGE_LOAD_STORE: &str = "GL_ARB_shader_image_load_store";
pub const ARB_TESSELLATION: &str = "GL_ARB_tessellation_shader";
pub const ARB_VIEWPORT_ARRAY: &str = "GL_ARB_viewport_array";
pub const ARB_VERTEX_ATTRIB_BINDING: &str = "GL_ARB_vertex_attrib_binding";
pub const ARB_FRAMEBUFFER_NO_ATTACHMENTS: &str = "GL_ARB_framebuffer_no_attachments";
pub const EXT_ANISOTROPIC: &str = "GL_EXT_texture_filter_anisotropic";
pub const EXT_NORM16: &str = "GL_EXT_texture_norm16";
pub const EXT_S3TC: &str = "GL_EXT_texture_compression_s3tc";
pub const ARB_RGTC: &str = "GL_ARB_texture_compression_rgtc";
pub const ARB_BPTC: &str = "GL_ARB_texture_compression_bptc";
pub const ARB_ES3_COMPATIBILITY: &str = "GL_ARB_ES3_compatibility";
pub const KHR_ASTC_LDR: &str = "GL_KHR_texture_compression_astc_ldr";

use Category::*;

const fn string(name: &'static str) -> ProbeDescriptor {
    ProbeDescriptor::new(name, Context, Query::String)
}

const fn int(name: &'static str, category: Category) -> ProbeDescriptor {
    ProbeDescriptor::new(name, category, Query::Integer)
}

const fn int64(name: &'static str, category: Category) -> ProbeDescriptor {
    ProbeDescriptor::new(name, category, Query::Integer64)
}

const fn indexed(name: &'static str, category: Category, count: u32) -> ProbeDescriptor {
    ProbeDescriptor::new(name, category, Query::Indexed { count })
}

const fn format(name: &'static str) -> ProbeDescriptor {
    ProbeDescriptor::new(name, TextureFormats, Query::Format)
}

const fn compressed(name: &'static str, extension: &'static str) -> ProbeDescriptor {
    ProbeDescriptor::new(name, CompressedFormats, Query::Format).requires(extension)
}

pub static BATTERY: &[ProbeDescriptor] = &[
    // Context
    string("GL_VENDOR"),
    string("GL_RENDERER"),
    string("GL_VERSION"),
    string("GL_SHADING_LANGUAGE_VERSION"),
    int("GL_MAJOR_VERSION", Context),
    int("GL_MINOR_VERSION", Context),
    int("GL_CONTEXT_FLAGS", Context),
    int("GL_CONTEXT_PROFILE_MASK", Context),
    // Limits
    int("GL_MAX_TEXTURE_SIZE", Limits),
    int("GL_MAX_3D_TEXTURE_SIZE", Limits),
    int("GL_MAX_CUBE_MAP_TEXTURE_SIZE", Limits),
    int("GL_MAX_ARRAY_TEXTURE_LAYERS", Limits),
    int("GL_MAX_RENDERBUFFER_SIZE", Limits),
    indexed("GL_MAX_VIEWPORT_DIMS", Limits, 2),
    int("GL_MAX_VIEWPORTS", Limits).requires(ARB_VIEWPORT_ARRAY),
    int("GL_MAX_COLOR_ATTACHMENTS", Limits),
    int("GL_MAX_DRAW_BUFFERS", Limits),
    int("GL_MAX_SAMPLES", Limits),
    int("GL_MAX_FRAMEBUFFER_WIDTH", Limits).requires(ARB_FRAMEBUFFER_NO_ATTACHMENTS),
    int("GL_MAX_FRAMEBUFFER_HEIGHT", Limits).requires(ARB_FRAMEBUFFER_NO_ATTACHMENTS),
    int("GL_MAX_VERTEX_ATTRIBS", Limits),
    int("GL_MAX_VERTEX_ATTRIB_STRIDE", Limits),
    int("GL_MAX_VERTEX_ATTRIB_BINDINGS", Limits).requires(ARB_VERTEX_ATTRIB_BINDING),
    int("GL_MAX_UNIFORM_BUFFER_BINDINGS", Limits),
    int("GL_UNIFORM_BUFFER_OFFSET_ALIGNMENT", Limits),
    int64("GL_MAX_UNIFORM_BLOCK_SIZE", Limits),
    int("GL_MAX_SHADER_STORAGE_BUFFER_BINDINGS", Limits).requires(ARB_SSBO),
    int("GL_SHADER_STORAGE_BUFFER_OFFSET_ALIGNMENT", Limits).requires(ARB_SSBO),
    int64("GL_MAX_SHADER_STORAGE_BLOCK_SIZE", Limits).requires(ARB_SSBO),
    int64("GL_MAX_ELEMENT_INDEX", Limits),
    int64("GL_MAX_SERVER_WAIT_TIMEOUT", Limits),
    ProbeDescriptor::new("GL_MAX_TEXTURE_LOD_BIAS", Limits, Query::Float),
    ProbeDescriptor::new("GL_MAX_TEXTURE_MAX_ANISOTROPY_EXT", Limits, Query::Float).requires(EXT_ANISOTROPIC),
    ProbeDescriptor::new("GL_SHADER_COMPILER", Limits, Query::Boolean),
    // Shader stages
    int("GL_MAX_VERTEX_UNIFORM_COMPONENTS", ShaderStages),
    int("GL_MAX_FRAGMENT_UNIFORM_COMPONENTS", ShaderStages),
    int("GL_MAX_VERTEX_UNIFORM_BLOCKS", ShaderStages),
    int("GL_MAX_FRAGMENT_UNIFORM_BLOCKS", ShaderStages),
    int("GL_MAX_TEXTURE_IMAGE_UNITS", ShaderStages),
    int("GL_MAX_VERTEX_TEXTURE_IMAGE_UNITS", ShaderStages),
    int("GL_MAX_COMBINED_TEXTURE_IMAGE_UNITS", ShaderStages),
    int("GL_MAX_VARYING_COMPONENTS", ShaderStages),
    int("GL_MAX_GEOMETRY_OUTPUT_VERTICES", ShaderStages),
    int("GL_MAX_TESS_GEN_LEVEL", ShaderStages).requires(ARB_TESSELLATION),
    int("GL_MAX_FRAGMENT_SHADER_STORAGE_BLOCKS", ShaderStages).requires(ARB_SSBO),
    int("GL_MAX_COMBINED_SHADER_STORAGE_BLOCKS", ShaderStages).requires(ARB_SSBO),
    int("GL_MAX_IMAGE_UNITS", ShaderStages).requires(ARB_IMAGE_LOAD_STORE),
    // Compute
    indexed("GL_MAX_COMPUTE_WORK_GROUP_COUNT", Compute, 3).requires(ARB_COMPUTE_SHADER),
    indexed("GL_MAX_COMPUTE_WORK_GROUP_SIZE", Compute, 3).requires(ARB_COMPUTE_SHADER),
    int("GL_MAX_COMPUTE_WORK_GROUP_INVOCATIONS", Compute).requires(ARB_COMPUTE_SHADER),
    int("GL_MAX_COMPUTE_SHARED_MEMORY_SIZE", Compute).requires(ARB_COMPUTE_SHADER),
    int("GL_MAX_COMPUTE_UNIFORM_BLOCKS", Compute).requires(ARB_COMPUTE_SHADER),
    int("GL_MAX_COMPUTE_SHADER_STORAGE_BLOCKS", Compute).requires(ARB_COMPUTE_SHADER),
    // Texture formats
    format("GL_R8"),
    format("GL_RG8"),
    format("GL_RGBA8"),
    format("GL_SRGB8_ALPHA8"),
    format("GL_R16F"),
    format("GL_RG16F"),
    format("GL_RGBA16F"),
    format("GL_R32F"),
    format("GL_RG32F"),
    format("GL_RGBA32F"),
    format("GL_R32UI"),
    format("GL_RGBA32UI"),
    format("GL_RGB10_A2"),
    format("GL_RGB9_E5"),
    format("GL_R16").requires(EXT_NORM16),
    format("GL_RGBA16").requires(EXT_NORM16),
    format("GL_DEPTH_COMPONENT16"),
    format("GL_DEPTH_COMPONENT24"),
    format("GL_DEPTH_COMPONENT32F"),
    format("GL_DEPTH24_STENCIL8"),
    format("GL_DEPTH32F_STENCIL8"),
    // Compressed formats
    compressed("GL_COMPRESSED_RGBA_S3TC_DXT1_EXT", EXT_S3TC),
    compressed("GL_COMPRESSED_RGBA_S3TC_DXT5_EXT", EXT_S3TC),
    compressed("GL_COMPRESSED_RED_RGTC1", ARB_RGTC),
    compressed("GL_COMPRESSED_RG_RGTC2", ARB_RGTC),
    compressed("GL_COMPRESSED_RGBA_BPTC_UNORM", ARB_BPTC),
    compressed("GL_COMPRESSED_RGB8_ETC2", ARB_ES3_COMPATIBILITY),
    compressed("GL_COMPRESSED_RGBA8_ETC2_EAC", ARB_ES3_COMPATIBILITY),
    compressed("GL_COMPRESSED_RGBA_ASTC_4x4_KHR", KHR_ASTC_LDR),
    compressed("GL_COMPRESSED_RGBA_ASTC_8x8_KHR", KHR_ASTC_LDR),
];
