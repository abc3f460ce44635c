//! Vertex buffer layouts
//!
//! A layout is an ordered list of attribute descriptors. Byte offsets and the
//! stride are derived once, by accumulating element sizes, when the layout is
//! built; the layout is immutable afterwards.

/// Data type of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Float1,
    Float2,
    Float3,
    Float4,
    Int1,
    Int2,
    Int3,
    Int4,
}

impl ElementType {
    pub fn component_count(self) -> u32 {
        match self {
            ElementType::Float1 | ElementType::Int1 => 1,
            ElementType::Float2 | ElementType::Int2 => 2,
            ElementType::Float3 | ElementType::Int3 => 3,
            ElementType::Float4 | ElementType::Int4 => 4,
        }
    }

    /// Size of one element in bytes.
    pub fn size(self) -> u32 {
        // f32 and i32 components are both four bytes wide.
        4 * self.component_count()
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            ElementType::Float1 | ElementType::Float2 | ElementType::Float3 | ElementType::Float4
        )
    }
}

/// One attribute in a [`VertexBufferLayout`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferElement {
    pub name: String,
    pub element_type: ElementType,
    pub normalized: bool,
    offset: u32,
}

impl BufferElement {
    pub fn new(name: &str, element_type: ElementType, normalized: bool) -> Self {
        Self {
            name: name.to_string(),
            element_type,
            normalized,
            offset: 0,
        }
    }

    /// Byte offset of this attribute inside one vertex.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn size(&self) -> u32 {
        self.element_type.size()
    }
}

/// Ordered vertex attribute layout with derived offsets and stride.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexBufferLayout {
    elements: Vec<BufferElement>,
    stride: u32,
}

impl VertexBufferLayout {
    pub fn new(elements: Vec<BufferElement>) -> Self {
        let mut elements = elements;
        let mut offset = 0;
        for element in elements.iter_mut() {
            element.offset = offset;
            offset += element.size();
        }

        Self {
            elements,
            stride: offset,
        }
    }

    /// Size of one vertex in bytes.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn elements(&self) -> &[BufferElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BufferElement> {
        self.elements.iter()
    }
}

impl FromIterator<BufferElement> for VertexBufferLayout {
    fn from_iter<T: IntoIterator<Item = BufferElement>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a VertexBufferLayout {
    type Item = &'a BufferElement;
    type IntoIter = std::slice::Iter<'a, BufferElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const ALL_TYPES: [ElementType; 8] = [
        ElementType::Float1,
        ElementType::Float2,
        ElementType::Float3,
        ElementType::Float4,
        ElementType::Int1,
        ElementType::Int2,
        ElementType::Int3,
        ElementType::Int4,
    ];

    #[test]
    fn test_position_texcoord_layout() {
        let layout = VertexBufferLayout::new(vec![
            BufferElement::new("position", ElementType::Float2, false),
            BufferElement::new("texcoord", ElementType::Float2, false),
        ]);

        assert_eq!(layout.stride(), 16);
        assert_eq!(layout.elements()[0].offset(), 0);
        assert_eq!(layout.elements()[1].offset(), 8);
    }

    #[test]
    fn test_stride_is_sum_and_offsets_accumulate() {
        let mut rng = rand::rng();

        for _ in 0..64 {
            let count = rng.random_range(1..8);
            let types: Vec<ElementType> = (0..count)
                .map(|_| ALL_TYPES[rng.random_range(0..ALL_TYPES.len())])
                .collect();

            let layout: VertexBufferLayout = types
                .iter()
                .enumerate()
                .map(|(i, ty)| BufferElement::new(&format!("a{}", i), *ty, false))
                .collect();

            let expected_stride: u32 = types.iter().map(|ty| ty.size()).sum();
            assert_eq!(layout.stride(), expected_stride);

            let mut running = 0;
            for (element, ty) in layout.iter().zip(types.iter()) {
                assert_eq!(element.offset(), running);
                running += ty.size();
            }
        }
    }

    #[test]
    fn test_empty_layout() {
        let layout = VertexBufferLayout::new(Vec::new());
        assert!(layout.is_empty());
        assert_eq!(layout.stride(), 0);
    }
}
