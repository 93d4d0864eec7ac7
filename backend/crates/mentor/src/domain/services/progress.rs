/// `round(completed / total * 100)`, or 0 when there are no sessions
pub fn progress_percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((completed as f64 / total as f64) * 100.0).round() as u8
}
