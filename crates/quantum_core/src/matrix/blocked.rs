// Divide-and-conquer product over row-major square buffers.
//
// Each level splits both operands into four quadrants and combines
// C_ij = A_i0 * B_0j + A_i1 * B_1j. Odd sizes are padded with a zero row and
// column before splitting; the padding is stripped from the result.

use crate::algebra::Scalar;

/// Below this size the triple loop wins.
const LEAF_SIZE: usize = 2;

/// A `size × size` window into a row-major buffer with row stride `stride`.
#[derive(Clone, Copy)]
struct Block<'a, T> {
    data: &'a [T],
    stride: usize,
    row: usize,
    col: usize,
    size: usize,
}

impl<'a, T: Scalar> Block<'a, T> {
    fn whole(data: &'a [T], size: usize) -> Self {
        Self {
            data,
            stride: size,
            row: 0,
            col: 0,
            size,
        }
    }

    fn at(&self, row: usize, col: usize) -> T {
        self.data[(self.row + row) * self.stride + self.col + col]
    }

    fn quadrant(&self, row: usize, col: usize) -> Self {
        let half = self.size / 2;
        Self {
            data: self.data,
            stride: self.stride,
            row: self.row + row * half,
            col: self.col + col * half,
            size: half,
        }
    }

    /// Copies the window into a fresh buffer of side `size + 1`, zero filled.
    fn padded(&self) -> Vec<T> {
        let side = self.size + 1;
        let mut output = vec![T::zero(); side * side];
        for row in 0..self.size {
            for col in 0..self.size {
                output[row * side + col] = self.at(row, col);
            }
        }
        output
    }
}

pub(super) fn multiply<T: Scalar>(lhs: &[T], rhs: &[T], size: usize) -> Vec<T> {
    product(Block::whole(lhs, size), Block::whole(rhs, size))
}

fn product<T: Scalar>(lhs: Block<'_, T>, rhs: Block<'_, T>) -> Vec<T> {
    let size = lhs.size;
    if size <= LEAF_SIZE {
        return brute_force(lhs, rhs);
    }

    if size % 2 == 1 {
        let side = size + 1;
        let lhs_padded = lhs.padded();
        let rhs_padded = rhs.padded();
        let full = product(Block::whole(&lhs_padded, side), Block::whole(&rhs_padded, side));
        return strip(&full, side, size);
    }

    let half = size / 2;
    let mut output = vec![T::zero(); size * size];
    for i in 0..2 {
        for j in 0..2 {
            let first = product(lhs.quadrant(i, 0), rhs.quadrant(0, j));
            let second = product(lhs.quadrant(i, 1), rhs.quadrant(1, j));
            for row in 0..half {
                for col in 0..half {
                    let value = first[row * half + col] + second[row * half + col];
                    output[(i * half + row) * size + j * half + col] = value;
                }
            }
        }
    }
    output
}

fn brute_force<T: Scalar>(lhs: Block<'_, T>, rhs: Block<'_, T>) -> Vec<T> {
    let size = lhs.size;
    let mut output = vec![T::zero(); size * size];
    for row in 0..size {
        for col in 0..size {
            output[row * size + col] = (0..size)
                .fold(T::zero(), |sum, k| sum + lhs.at(row, k) * rhs.at(k, col));
        }
    }
    output
}

fn strip<T: Scalar>(full: &[T], side: usize, size: usize) -> Vec<T> {
    full.chunks(side)
        .take(size)
        .flat_map(|row| row[..size].iter().copied())
        .collect()
}
