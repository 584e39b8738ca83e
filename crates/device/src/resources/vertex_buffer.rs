use super::{Bindable, VertexLayout, check};
use crate::error::ResourceError;
use glhal_native::{BufferId, GlBackend};
use std::marker::PhantomData;
use std::rc::Rc;

/// Fixed-capacity vertex buffer of `T`.
pub struct VertexBuffer<T: VertexLayout> {
    gl: Rc<dyn GlBackend>,
    id: BufferId,
    capacity: usize,
    _vertex: PhantomData<T>,
}

impl<T: VertexLayout> VertexBuffer<T> {
    pub(crate) fn new(gl: Rc<dyn GlBackend>, capacity: usize) -> Result<Self, ResourceError> {
        let id = gl.create_buffer().map_err(|e| ResourceError::Create {
            kind: "vertex buffer",
            message: e.0,
        })?;
        let buffer = Self {
            gl,
            id,
            capacity,
            _vertex: PhantomData,
        };
        // Dropping `buffer` on this path deletes the native id.
        let Some(bytes) = capacity.checked_mul(std::mem::size_of::<T>()) else {
            return Err(ResourceError::Create {
                kind: "vertex buffer",
                message: format!("{capacity} vertices do not fit in memory"),
            });
        };
        buffer.gl.allocate_vertex_buffer(id, bytes);
        check(buffer.gl.as_ref(), "glBufferData")?;
        tracing::debug!("created vertex buffer {} for {capacity} vertices", id.get());
        Ok(buffer)
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Number of vertices the buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Overwrite vertices `start..start + data.len()`.
    pub fn set_data(&self, data: &[T], start: usize) -> Result<(), ResourceError> {
        let out_of_range = ResourceError::OutOfRange {
            start,
            count: data.len(),
            capacity: self.capacity,
        };
        match start.checked_add(data.len()) {
            Some(end) if end <= self.capacity => {}
            _ => return Err(out_of_range),
        }
        self.gl.write_vertex_buffer(
            self.id,
            start * std::mem::size_of::<T>(),
            bytemuck::cast_slice(data),
        );
        check(self.gl.as_ref(), "glBufferSubData")
    }
}

impl<T: VertexLayout> Bindable for VertexBuffer<T> {
    /// Bind the buffer and point every attribute of `T` into it.
    fn bind(&self) -> Result<(), ResourceError> {
        let gl = self.gl.as_ref();
        gl.bind_vertex_buffer(Some(self.id));
        check(gl, "glBindBuffer")?;
        let stride = std::mem::size_of::<T>() as i32;
        for &attribute in T::attributes() {
            gl.vertex_attrib_pointer(attribute, stride);
            check(gl, "glVertexAttribPointer")?;
        }
        Ok(())
    }
}

impl<T: VertexLayout> Drop for VertexBuffer<T> {
    fn drop(&mut self) {
        if self.gl.is_alive() {
            self.gl.delete_buffer(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Vertex;
    use glhal_native::testing::{FakeGl, GlCall};

    #[test]
    fn allocates_capacity_in_bytes() {
        let gl = Rc::new(FakeGl::new());
        let buffer = VertexBuffer::<Vertex>::new(gl.clone(), 6).unwrap();
        assert!(gl.calls().contains(&GlCall::AllocateVertexBuffer {
            buffer: buffer.id(),
            size: 6 * 20,
        }));
    }

    #[test]
    fn oversized_capacity_is_a_creation_error() {
        let gl = Rc::new(FakeGl::new());
        let err = VertexBuffer::<Vertex>::new(gl.clone(), usize::MAX / 4)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ResourceError::Create {
                kind: "vertex buffer",
                ..
            }
        ));
        assert_eq!(gl.count(|c| matches!(c, GlCall::AllocateVertexBuffer { .. })), 0);
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteBuffer(_))), 1);
    }

    #[test]
    fn set_data_writes_at_element_offset() {
        let gl = Rc::new(FakeGl::new());
        let buffer = VertexBuffer::<Vertex>::new(gl.clone(), 6).unwrap();
        buffer.set_data(&[Vertex::default(); 2], 3).unwrap();
        assert!(gl.calls().contains(&GlCall::WriteVertexBuffer {
            buffer: buffer.id(),
            offset: 60,
            len: 40,
        }));
    }

    #[test]
    fn overflowing_write_is_rejected() {
        let gl = Rc::new(FakeGl::new());
        let buffer = VertexBuffer::<Vertex>::new(gl.clone(), 4).unwrap();
        let err = buffer.set_data(&[Vertex::default(); 2], 3).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::OutOfRange {
                start: 3,
                count: 2,
                capacity: 4
            }
        ));
        assert_eq!(gl.count(|c| matches!(c, GlCall::WriteVertexBuffer { .. })), 0);
    }

    #[test]
    fn bind_points_both_attributes() {
        let gl = Rc::new(FakeGl::new());
        let buffer = VertexBuffer::<Vertex>::new(gl.clone(), 1).unwrap();
        gl.take_calls();
        buffer.bind().unwrap();
        let calls = gl.calls();
        assert_eq!(calls[0], GlCall::BindVertexBuffer(Some(buffer.id())));
        assert_eq!(
            gl.count(|c| matches!(c, GlCall::VertexAttribPointer { stride: 20, .. })),
            2
        );
    }
}
