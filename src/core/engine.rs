use std::fmt::{Debug, Display};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::core::definitions::{Move, Square};
use crate::core::utils::{compact_pos, in_direction, is_valid_coord, is_valid_square, unpack_pos};

/** Variation of 0x88 board.
 *
 * Cells hold piece codes; the low nibble of a position byte is the file,
 * the high nibble the rank. Validity of a board requires exactly one king
 * per color -- the board itself stays permissive so position fragments can
 * be set up, `Game` asserts the invariant on construction. */
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    #[serde_as(as = "Bytes")]
    arr: [u8; 128],
    /** Append-only, entries carry the eliminated flag. */
    captured: Vec<Piece>,
    /** Occupancy at the last `is_changed` observation. */
    #[serde_as(as = "Bytes")]
    observed: [u8; 128],
}

impl Board {
    #[rustfmt::skip]
    pub fn new() -> Board {
        let arr = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        ];
        Board {
            arr,
            captured: Vec::new(),
            observed: arr,
        }
    }

    pub fn inside(&self) -> &[u8; 128] {
        &self.arr
    }

    pub fn get(&self, rank: u8, file: u8) -> Piece {
        let position = compact_pos(rank, file);
        Piece::from_code(self.arr[position as usize], position)
    }

    /** Grid lookup. `None` for empty cells and offboard squares. */
    pub fn get_piece(&self, square: Square) -> Option<Piece> {
        if !is_valid_square(square) {
            return None;
        }
        let piece = self.get(square.0, square.1);
        piece.kind().is_valid().then_some(piece)
    }

    /** Places a piece with pristine flags. Overwrites the cell. */
    pub fn place_piece(&mut self, kind: PieceType, color: Color, square: Square) -> bool {
        if !is_valid_square(square) || !kind.is_valid() {
            return false;
        }
        self.arr[compact_pos(square.0, square.1) as usize] = kind as u8 | color as u8;
        true
    }

    pub fn check_for_enemy(&self, square: Square, color: Color) -> bool {
        is_valid_square(square) && self.enemy_at(compact_pos(square.0, square.1), color)
    }

    pub fn check_for_friendly(&self, square: Square, color: Color) -> bool {
        is_valid_square(square) && self.friendly_at(compact_pos(square.0, square.1), color)
    }

    pub fn check_for_empty(&self, square: Square) -> bool {
        is_valid_square(square) && self.arr[compact_pos(square.0, square.1) as usize] == 0x00
    }

    fn enemy_at(&self, pos: u8, color: Color) -> bool {
        let cell = self.arr[pos as usize];
        cell != 0x00 && Color::from_byte(cell) != color
    }

    fn friendly_at(&self, pos: u8, color: Color) -> bool {
        let cell = self.arr[pos as usize];
        cell != 0x00 && Color::from_byte(cell) == color
    }

    /** Geometric destination set of one piece: derived from kind, position
     * and occupancy only. The king variant additionally never steps onto a
     * square where it would stand in check (see `king_moves`), every other
     * kind may still expose its own king -- callers filter. */
    pub fn geometric_moves(&self, piece: &Piece) -> Vec<u8> {
        let mut moves = Vec::new();
        match piece.kind() {
            PieceType::Pawn => {
                let step: u8 = match piece.color() {
                    Color::White => 0x10,
                    Color::Black => 0xf0,
                };
                let front = piece.position.wrapping_add(step);
                if is_valid_coord(front) && self.arr[front as usize] == 0x00 {
                    moves.push(front);
                    let jump = front.wrapping_add(step);
                    if !piece.has_moved() && is_valid_coord(jump) && self.arr[jump as usize] == 0x00
                    {
                        moves.push(jump);
                    }
                }
                for side in [0x01, 0xff] {
                    let pos = front.wrapping_add(side);
                    if is_valid_coord(pos) && self.enemy_at(pos, piece.color()) {
                        moves.push(pos);
                    }
                }
            }
            PieceType::Knight => {
                for pos in KNIGHT_MOVES
                    .iter()
                    .map(|off| piece.position.wrapping_add(*off))
                {
                    if is_valid_coord(pos) && !self.friendly_at(pos, piece.color()) {
                        moves.push(pos);
                    }
                }
            }
            PieceType::King => return self.king_moves(piece),
            PieceType::EmptySquare | PieceType::Invalid => (),
            sliding_kind => {
                let directions = match sliding_kind {
                    PieceType::Bishop => BISHOP_DIR,
                    PieceType::Rook => ROOK_DIR,
                    PieceType::Queen => QUEEN_DIR,
                    _ => unreachable!(),
                };
                for dir in directions {
                    for pos in in_direction(piece.position, *dir) {
                        let cell = self.arr[pos as usize];
                        if cell == 0x00 {
                            moves.push(pos);
                        } else {
                            if Color::from_byte(cell) != piece.color() {
                                moves.push(pos);
                            }
                            break;
                        }
                    }
                }
            }
        }
        moves
    }

    /** King destinations, filtered in order:
     * friendly squares out, squares touching the enemy king out, squares in
     * the static enemy attack set out, and finally a relocation probe on a
     * board copy to catch attacks along the line the king vacates. */
    fn king_moves(&self, king: &Piece) -> Vec<u8> {
        let color = king.color();
        let mut moves: Vec<u8> = KING_MOVES
            .iter()
            .map(|off| king.position.wrapping_add(*off))
            .filter(|pos| is_valid_coord(*pos) && !self.friendly_at(*pos, color))
            .collect();
        if let Some(enemy_king) = self.king_pos(color.opposite()) {
            moves.retain(|pos| {
                *pos != enemy_king
                    && KING_MOVES
                        .iter()
                        .all(|off| enemy_king.wrapping_add(*off) != *pos)
            });
        }
        let attacked = self.attack_moves(color);
        moves.retain(|pos| attacked.iter().all(|(_, to)| to != pos));
        moves.retain(|pos| {
            let mut future = self.clone();
            future.arr[king.position()] = 0x00;
            future.arr[*pos as usize] = king.code;
            future.attack_moves(color).iter().all(|(_, to)| to != pos)
        });
        moves
    }

    fn moves_of_color(&self, color: Color) -> Vec<(u8, u8)> {
        let mut moves = Vec::with_capacity(64);
        for piece in self
            .iter_pieces()
            .filter(|piece| piece.kind().is_valid() && piece.color() == color)
        {
            let from = piece.position;
            moves.extend(self.geometric_moves(&piece).into_iter().map(|to| (from, to)));
        }
        moves
    }

    /** Attack squares of everything NOT of `color`, enemy king excluded.
     * Pawn pushes are filtered out: a king may stand in front of a pawn. */
    fn attack_moves(&self, color: Color) -> Vec<(u8, u8)> {
        let mut moves = Vec::with_capacity(64);
        for piece in self.iter_pieces().filter(|piece| {
            piece.kind().is_valid()
                && piece.color() != color
                && piece.kind() != PieceType::King
        }) {
            let from = piece.position;
            for to in self.geometric_moves(&piece) {
                if piece.kind() == PieceType::Pawn && to & 0x0f == from & 0x0f {
                    continue;
                }
                moves.push((from, to));
            }
        }
        moves
    }

    /** Every geometric move of `color`: pieces in row-major board order,
     * each piece's moves in its generator's order. NOT king-safety
     * filtered -- callers simulate each candidate themselves. */
    pub fn get_moves(&self, color: Color) -> Vec<Move> {
        self.moves_of_color(color)
            .into_iter()
            .map(|(from, to)| Move::new(unpack_pos(from), unpack_pos(to)))
            .collect()
    }

    /** Moves threatening `color`, i.e. the attack set of its opponents. */
    pub fn enemy_moves(&self, color: Color) -> Vec<Move> {
        self.attack_moves(color)
            .into_iter()
            .map(|(from, to)| Move::new(unpack_pos(from), unpack_pos(to)))
            .collect()
    }

    fn king_pos(&self, color: Color) -> Option<u8> {
        self.iter_pieces()
            .find(|piece| piece.kind() == PieceType::King && piece.color() == color)
            .map(|piece| piece.position)
    }

    /** First row-major match; with more than one king of a color the
     * choice between them is unspecified. */
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.king_pos(color).map(unpack_pos)
    }

    /** True iff any enemy geometric move targets the king of `color`,
     * together with the attacking pieces. */
    pub fn is_check(&self, color: Color) -> (bool, Vec<Piece>) {
        let Some(king) = self.king_pos(color) else {
            return (false, Vec::new());
        };
        let attackers: Vec<Piece> = self
            .moves_of_color(color.opposite())
            .into_iter()
            .filter(|(_, to)| *to == king)
            .map(|(from, _)| Piece::from_code(self.arr[from as usize], from))
            .collect();
        (!attackers.is_empty(), attackers)
    }

    /** `legal_moves` is the caller's king-safety-filtered move list. */
    pub fn check_for_check_mate(&self, color: Color, legal_moves: &[Move]) -> bool {
        let (in_check, _) = self.is_check(color);
        in_check && legal_moves.is_empty()
    }

    /** Stalemate: no legal move while not in check. */
    pub fn check_for_pat(&self, color: Color, legal_moves: &[Move]) -> bool {
        let (in_check, _) = self.is_check(color);
        !in_check && legal_moves.is_empty()
    }

    /** Applies `start -> end` iff `end` is in the mover's geometric set as
     * computed fresh right now. Kings are never captured: a move onto the
     * enemy king is rejected, checkmate ends the game instead. On failure
     * the board is untouched. */
    pub fn move_piece(&mut self, start: Square, end: Square) -> bool {
        if !is_valid_square(start) || !is_valid_square(end) {
            return false;
        }
        let from = compact_pos(start.0, start.1);
        let to = compact_pos(end.0, end.1);
        let piece = Piece::from_code(self.arr[from as usize], from);
        if !piece.kind().is_valid() {
            trace!("rejected move from empty square {start:?}");
            return false;
        }
        if !self.geometric_moves(&piece).contains(&to) {
            trace!("rejected move {start:?} -> {end:?}: not a move of {piece:?}");
            return false;
        }
        let target = Piece::from_code(self.arr[to as usize], to);
        if target.kind().is_valid() {
            if !target.kind().destructible() {
                debug!("rejected capture of the {} king", target.color());
                return false;
            }
            debug_assert!(target.color() != piece.color());
            debug!("{piece:?} captures {target:?}");
            self.captured.push(target.eliminated_at(to));
        }
        self.arr[from as usize] = 0x00;
        self.arr[to as usize] = PieceFlag::Moved.set(piece.code);
        true
    }

    /** Has the occupancy changed since the last observation? Refreshes the
     * snapshot whenever it reports true. */
    pub fn is_changed(&mut self) -> bool {
        if self.arr != self.observed {
            self.observed = self.arr;
            true
        } else {
            false
        }
    }

    pub fn captured_pieces(&self) -> &[Piece] {
        &self.captured
    }

    /** Six 8x8 planes in order Pawn, Rook, Knight, Bishop, Queen, King:
     * +1 White, -1 Black, 0 empty. */
    pub fn translate_to_matrix(&self) -> [[[i8; 8]; 8]; 6] {
        let mut planes = [[[0i8; 8]; 8]; 6];
        for piece in self.iter_pieces().filter(|piece| piece.kind().is_valid()) {
            let plane = match piece.kind() {
                PieceType::Pawn => 0,
                PieceType::Rook => 1,
                PieceType::Knight => 2,
                PieceType::Bishop => 3,
                PieceType::Queen => 4,
                PieceType::King => 5,
                _ => unreachable!(),
            };
            let (rank, file): (usize, usize) = unpack_pos(piece.position);
            planes[plane][rank][file] = if piece.color() == Color::White { 1 } else { -1 };
        }
        planes
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        ITER_INDEX.iter().map(|&i| self.arr[i])
    }

    /** Row-major: rank 0 file 0 first. */
    pub fn iter_pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        ITER_INDEX
            .iter()
            .map(|&i| Piece::from_code(self.arr[i], i as u8))
    }
}

impl Default for Board {
    #[rustfmt::skip]
    fn default() -> Self {
        let arr = [
            0x84, 0x82, 0x83, 0x85, 0x86, 0x83, 0x82, 0x84, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x81, 0x81, 0x81, 0x81, 0x81, 0x81, 0x81, 0x81, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0x04, 0x02, 0x03, 0x05, 0x06, 0x03, 0x02, 0x04, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        ];
        Board {
            arr,
            captured: Vec::new(),
            observed: arr,
        }
    }
}

/** Occupancy equality; the observation snapshot is observer state and
 * does not take part. */
impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.arr == other.arr && self.captured == other.captured
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  0 1 2 3 4 5 6 7")?;
        for rank in 0..8u8 {
            write!(f, "{rank}")?;
            for file in 0..8u8 {
                write!(f, " {}", self.get(rank, file).as_char())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

const ITER_INDEX: [usize; 64] = {
    let mut arr = [0; 64];
    let mut rank = 0;
    let mut file = 0;
    while rank < 8 {
        arr[rank * 8 + file] = rank << 4 | file;
        if file < 7 {
            file += 1;
        } else {
            file = 0;
            rank += 1;
        }
    }
    arr
};

/** Tables of directions for sliding pieces */
const BISHOP_DIR: &[u8] = &[0x11, 0x0f, 0xef, 0xf1];
const ROOK_DIR: &[u8] = &[0x10, 0xff, 0xf0, 0x01];
const QUEEN_DIR: &[u8] = &[0x11, 0x0f, 0xef, 0xf1, 0x10, 0xff, 0xf0, 0x01];

/** Possible moves for offset pieces */
const KING_MOVES: &[u8] = QUEEN_DIR;
const KNIGHT_MOVES: &[u8] = &[0x12, 0x21, 0x1f, 0x0e, 0xee, 0xdf, 0xe1, 0xf2];

/** Bits structure of piece code
 * Bit 7 -- Color of the piece
 * - 1 -- White
 * - 0 -- Black
 * Bit 6 -- Eliminated flag, set when the piece is captured
 * Bit 3 -- Piece has moved flag
 * Bits 2-0 Piece kind
 * - 1 -- Pawn
 * - 2 -- Knight
 * - 3 -- Bishop
 * - 4 -- Rook
 * - 5 -- Queen
 * - 6 -- King
 * - 7 -- Not used
 * - 0 -- Empty Square */
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    code: u8,
    position: u8,
}

pub enum PieceFlag {
    /** Bit 3 -- Piece has moved flag */
    Moved = 0x08,
    /** Bit 6 -- Piece was captured */
    Eliminated = 0x40,
}

impl PieceFlag {
    pub fn is_set(self, code: u8) -> bool {
        code & self as u8 != 0
    }

    fn set(self, code: u8) -> u8 {
        code | self as u8
    }
}

impl Piece {
    pub fn new(kind: PieceType, color: Color, position: u8) -> Piece {
        Piece {
            code: kind as u8 | color as u8,
            position,
        }
    }

    pub fn from_code(code: u8, position: u8) -> Piece {
        Piece { code, position }
    }

    pub fn color(&self) -> Color {
        Color::from_byte(self.code)
    }

    pub fn kind(&self) -> PieceType {
        PieceType::from_byte(self.code)
    }

    pub fn position(&self) -> usize {
        self.position as usize
    }

    pub fn square(&self) -> Square {
        unpack_pos(self.position)
    }

    pub fn has_moved(&self) -> bool {
        PieceFlag::Moved.is_set(self.code)
    }

    pub fn eliminated(&self) -> bool {
        PieceFlag::Eliminated.is_set(self.code)
    }

    fn eliminated_at(&self, position: u8) -> Piece {
        Piece {
            code: PieceFlag::Eliminated.set(self.code),
            position,
        }
    }

    fn as_char(&self) -> char {
        let c = match self.kind() {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
            PieceType::EmptySquare | PieceType::Invalid => return '.',
        };
        if self.color() == Color::White {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }
}

impl Debug for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Piece")
            .field("code", &self.code)
            .field("square", &self.square())
            .field("color", &self.color())
            .field("kind", &self.kind())
            .finish()
    }
}

#[repr(u8)]
#[derive(PartialEq, Eq, Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub enum Color {
    Black = 0x00,
    #[default]
    White = 0x80,
}

impl Color {
    #[inline]
    fn from_byte(byte: u8) -> Color {
        unsafe { std::mem::transmute(byte & 0x80) }
    }

    pub fn opposite(self) -> Color {
        if self == Color::White {
            Color::Black
        } else {
            Color::White
        }
    }
}

impl From<u8> for Color {
    fn from(value: u8) -> Self {
        Color::from_byte(value)
    }
}

impl From<Color> for u8 {
    fn from(value: Color) -> Self {
        value as u8
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(if self == &Self::White {
            "White"
        } else {
            "Black"
        })
    }
}

#[repr(u8)]
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum PieceType {
    Pawn = 0x01,
    Knight = 0x02,
    Bishop = 0x03,
    Rook = 0x04,
    Queen = 0x05,
    King = 0x06,
    Invalid = 0x07,
    EmptySquare = 0x00,
}

impl PieceType {
    #[inline]
    fn from_byte(byte: u8) -> PieceType {
        unsafe { std::mem::transmute(byte & 0x07) }
    }

    pub fn is_valid(&self) -> bool {
        matches!(
            self,
            Self::Pawn | Self::Knight | Self::Bishop | Self::Rook | Self::Queen | Self::King
        )
    }

    /** Kings are not destructible: capturing one is forbidden by rule. */
    pub fn destructible(&self) -> bool {
        !matches!(self, Self::King)
    }
}

impl From<u8> for PieceType {
    fn from(value: u8) -> Self {
        PieceType::from_byte(value)
    }
}

impl From<PieceType> for u8 {
    fn from(value: PieceType) -> Self {
        value as u8
    }
}
