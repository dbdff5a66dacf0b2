use crate::error::RenderError;
use crate::texture::{ResourceState, TextureHandle};

#[derive(Debug, Clone)]
pub enum Command {
    WriteTexture {
        texture: TextureHandle,
        data: Vec<u8>,
        row_pitch: usize,
    },
    SetPermanentTextureState {
        texture: TextureHandle,
        state: ResourceState,
    },
}

/// Recorded GPU work. Lists are recorded between [`CommandList::open`] and
/// [`CommandList::close`] and only closed lists can be executed.
#[derive(Debug)]
pub struct CommandList {
    id: u64,
    open: bool,
    commands: Vec<Command>,
}

impl CommandList {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            open: false,
            commands: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    pub fn open(&mut self) {
        self.commands.clear();
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn write_texture(
        &mut self,
        texture: &TextureHandle,
        data: &[u8],
        row_pitch: usize,
    ) -> Result<(), RenderError> {
        if !self.open {
            return Err(RenderError::CommandListClosed(self.id));
        }
        let expected = row_pitch * texture.desc.height as usize;
        if data.len() != expected {
            return Err(RenderError::UploadSizeMismatch {
                expected,
                got: data.len(),
            });
        }
        self.commands.push(Command::WriteTexture {
            texture: texture.clone(),
            data: data.to_vec(),
            row_pitch,
        });
        Ok(())
    }

    pub fn set_permanent_texture_state(
        &mut self,
        texture: &TextureHandle,
        state: ResourceState,
    ) -> Result<(), RenderError> {
        if !self.open {
            return Err(RenderError::CommandListClosed(self.id));
        }
        self.commands.push(Command::SetPermanentTextureState {
            texture: texture.clone(),
            state,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{Format, GpuTexture, TextureDesc};
    use std::sync::Arc;

    fn texture() -> TextureHandle {
        Arc::new(GpuTexture {
            id: 1,
            desc: TextureDesc::new(2, 2, Format::Rgba8Unorm),
        })
    }

    #[test]
    fn test_recording_requires_open_list() {
        let texture = texture();
        let mut list = CommandList::new(3);
        assert_eq!(
            list.write_texture(&texture, &[0; 16], 8),
            Err(RenderError::CommandListClosed(3))
        );

        list.open();
        list.write_texture(&texture, &[0; 16], 8).unwrap();
        list.set_permanent_texture_state(&texture, ResourceState::ShaderResource)
            .unwrap();
        list.close();
        assert_eq!(list.commands().len(), 2);
    }

    #[test]
    fn test_write_texture_checks_size() {
        let texture = texture();
        let mut list = CommandList::new(0);
        list.open();
        assert_eq!(
            list.write_texture(&texture, &[0; 15], 8),
            Err(RenderError::UploadSizeMismatch {
                expected: 16,
                got: 15
            })
        );
    }
}
