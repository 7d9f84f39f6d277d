/// SlotVec is an index addressable list that grows on demand, filling new slots with defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotVec<T> {
    items: Vec<T>,
}

impl<T: Clone + Default> SlotVec<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Grow so that `index` is addressable; capacity at least doubles on each reallocation
    pub fn ensure(&mut self, index: usize) {
        if index < self.items.len() {
            return;
        }
        if index >= self.items.capacity() {
            let target = (self.items.capacity() * 2).max(index + 1);
            self.items.reserve_exact(target - self.items.len());
        }
        self.items.resize(index + 1, T::default());
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn set(&mut self, index: usize, value: T) {
        self.ensure(index);
        self.items[index] = value;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Clone + Default> FromIterator<T> for SlotVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}
