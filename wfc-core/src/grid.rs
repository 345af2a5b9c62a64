#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub(crate) data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// Creates a new grid with the given dimensions, initialized with default values.
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        let size = width * height * depth;
        Self {
            width,
            height,
            depth,
            data: vec![T::default(); size],
        }
    }
}

impl<T> Grid<T> {
    /// Wraps a flat buffer laid out as `z * width * height + y * width + x`.
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn from_vec(width: usize, height: usize, depth: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == width * height * depth).then_some(Self {
            width,
            height,
            depth,
            data,
        })
    }

    /// Returns an immutable reference to the element at the given coordinates,
    /// or None if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&T> {
        self.index(x, y, z).and_then(|idx| self.data.get(idx))
    }

    /// Returns a mutable reference to the element at the given coordinates,
    /// or None if the coordinates are out of bounds.
    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> Option<&mut T> {
        self.index(x, y, z).and_then(move |idx| self.data.get_mut(idx))
    }

    /// Calculates the 1D index for the given 3D coordinates.
    /// Returns None if the coordinates are out of bounds.
    pub fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if x < self.width && y < self.height && z < self.depth {
            Some(z * self.width * self.height + y * self.width + x)
        } else {
            None
        }
    }

    /// Inverse of [`Grid::index`].
    pub fn coords(&self, index: usize) -> Option<(usize, usize, usize)> {
        if index >= self.data.len() {
            return None;
        }
        let layer = self.width * self.height;
        let z = index / layer;
        let rest = index % layer;
        Some((rest % self.width, rest / self.width, z))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_and_coords_agree() {
        let grid: Grid<u8> = Grid::new(4, 3, 2);
        for z in 0..2 {
            for y in 0..3 {
                for x in 0..4 {
                    let index = grid.index(x, y, z).unwrap();
                    assert_eq!(grid.coords(index), Some((x, y, z)));
                }
            }
        }
        assert_eq!(grid.index(4, 0, 0), None);
        assert_eq!(grid.coords(24), None);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Grid::from_vec(2, 2, 1, vec![1, 2, 3]).is_none());
        let mut grid = Grid::from_vec(2, 2, 1, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(grid.get(1, 1, 0), Some(&4));
        *grid.get_mut(0, 1, 0).unwrap() = 9;
        assert_eq!(grid.as_slice(), &[1, 2, 9, 4]);
    }
}
