/// Hands out scalar temporaries and array cells from two separate regions.
/// Nothing is ever reclaimed.
#[derive(Clone, Debug)]
pub struct TempManager {
    next_temp: usize,
    next_cell: usize,
    step: usize,
}

impl TempManager {
    pub fn new(temp_start: usize, array_start: usize, step: usize) -> Self {
        Self {
            next_temp: temp_start,
            next_cell: array_start,
            step,
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn get_temp(&mut self) -> usize {
        let address = self.next_temp;
        self.next_temp += self.step;
        address
    }

    pub fn get_arr_temp(&mut self) -> usize {
        let address = self.next_cell;
        self.next_cell += self.step;
        address
    }

    /// The next array cell to be handed out.
    pub fn array_pointer(&self) -> usize {
        self.next_cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_grow_independently() {
        let mut temps = TempManager::new(1500, 3000, 4);
        assert_eq!(temps.get_temp(), 1500);
        assert_eq!(temps.get_arr_temp(), 3000);
        assert_eq!(temps.get_arr_temp(), 3004);
        assert_eq!(temps.get_temp(), 1504);
        assert_eq!(temps.array_pointer(), 3008);
    }
}
