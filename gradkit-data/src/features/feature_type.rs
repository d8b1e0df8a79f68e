/// Element type of a feature container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureType {
    Bool,
    Char,
    Byte,
    Short,
    Word,
    Int,
    Uint,
    Long,
    Ulong,
    ShortReal,
    DReal,
    LongReal,
    Any,
}

/// Storage class of a feature container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureClass {
    /// Dense matrix, one vector per column.
    Simple,
    String,
    Sparse,
    Any,
}

/// Element types that can be stored in a [`SimpleFeatures`](super::SimpleFeatures).
pub trait FeatureElement: Copy + Send + Sync + 'static {
    const FEATURE_TYPE: FeatureType;
}

macro_rules! impl_feature_element {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl FeatureElement for $ty {
                const FEATURE_TYPE: FeatureType = FeatureType::$tag;
            }
        )*
    };
}

impl_feature_element!(
    bool => Bool,
    i8 => Char,
    u8 => Byte,
    i16 => Short,
    u16 => Word,
    i32 => Int,
    u32 => Uint,
    i64 => Long,
    u64 => Ulong,
    f32 => ShortReal,
    f64 => DReal,
);
