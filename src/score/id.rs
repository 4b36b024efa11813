/// Monotonic id streams for notes and hi-speed changes.
///
/// One allocator per load keeps ids document-local; callers that want
/// ids to keep climbing across documents pass the same allocator back in.
/// Within one invocation ids only ever increase and are never reused.
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    next_note: i32,
    next_hi_speed: i32,
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator::default()
    }

    pub fn next_note_id(&mut self) -> i32 {
        let id = self.next_note;
        self.next_note += 1;
        id
    }

    pub fn next_hi_speed_id(&mut self) -> i32 {
        let id = self.next_hi_speed;
        self.next_hi_speed += 1;
        id
    }
}
